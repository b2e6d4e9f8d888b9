//! Architecture preference registry
//!
//! LaunchServices keeps per-application architecture choices in its
//! preferences plist:
//!
//! ```text
//! "Architectures for arm64" => {
//!     "com.apple.dt.Xcode" => [<bookmark>, "x86_64", <bookmark>, "arm64", ...]
//! }
//! ```
//!
//! Each bookmark identifies one installed copy of the application. Bookmarks
//! of deleted copies no longer resolve and are skipped, as are entries with a
//! label other than a known [`Architecture`].

use crate::architecture::Architecture;
use crate::error::{ArchError, Result};
use plist::Value;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Bundle identifier of Xcode
pub const XCODE_BUNDLE_IDENTIFIER: &str = "com.apple.dt.Xcode";

/// Architecture reported for applications without a recorded preference
pub const DEFAULT_ARCHITECTURE: Architecture = Architecture::Arm64;

/// Turns an opaque location reference into the current path of its target
pub trait LocationResolver {
    /// Current absolute path, or `None` when the reference is stale
    fn resolve(&self, blob: &[u8]) -> Option<PathBuf>;
}

impl<F> LocationResolver for F
where
    F: Fn(&[u8]) -> Option<PathBuf>,
{
    fn resolve(&self, blob: &[u8]) -> Option<PathBuf> {
        self(blob)
    }
}

/// The architecture recorded for one application path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchitectureRecord {
    pub application_path: PathBuf,
    pub architecture: Architecture,
}

impl ArchitectureRecord {
    pub fn new(application_path: impl Into<PathBuf>, architecture: Architecture) -> Self {
        Self {
            application_path: application_path.into(),
            architecture,
        }
    }
}

/// The preference write handed to the OS
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreferenceUpdate {
    pub application_path: PathBuf,
    pub architecture: Architecture,
}

/// Which part of the preferences tree holds the records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryKeys {
    /// Architecture of the machine the preferences were recorded on
    pub host: Architecture,
    /// Bundle identifier of the application
    pub bundle_identifier: String,
}

impl RegistryKeys {
    pub fn new(host: Architecture, bundle_identifier: impl Into<String>) -> Self {
        Self {
            host,
            bundle_identifier: bundle_identifier.into(),
        }
    }

    /// Top-level key, e.g. `Architectures for arm64`
    pub fn host_key(&self) -> String {
        format!("Architectures for {}", self.host)
    }
}

impl Default for RegistryKeys {
    fn default() -> Self {
        Self::new(Architecture::Arm64, XCODE_BUNDLE_IDENTIFIER)
    }
}

/// Decode the records for one application from the preferences tree.
///
/// Fails only when the tree does not have the expected shape. An application
/// that was never configured has no entry and decodes to an empty list.
pub fn decode_registry(
    tree: &Value,
    keys: &RegistryKeys,
    resolver: &impl LocationResolver,
) -> Result<Vec<ArchitectureRecord>> {
    let host_key = keys.host_key();

    let root = tree
        .as_dictionary()
        .ok_or_else(|| ArchError::InvalidRegistry("expected a dictionary at the top level".into()))?;

    let by_bundle = root
        .get(&host_key)
        .ok_or_else(|| ArchError::InvalidRegistry(format!("missing key {:?}", host_key)))?
        .as_dictionary()
        .ok_or_else(|| ArchError::InvalidRegistry(format!("expected {:?} to be a dictionary", host_key)))?;

    let Some(entries) = by_bundle.get(&keys.bundle_identifier) else {
        tracing::debug!(bundle = %keys.bundle_identifier, "No architecture preferences recorded");
        return Ok(Vec::new());
    };

    let entries = entries.as_array().ok_or_else(|| {
        ArchError::InvalidRegistry(format!(
            "expected {:?} to be an array",
            keys.bundle_identifier
        ))
    })?;

    if entries.len() % 2 != 0 {
        return Err(ArchError::InvalidRegistry(format!(
            "expected {:?} to alternate bookmarks and architectures, found {} values",
            keys.bundle_identifier,
            entries.len()
        )));
    }

    let records = entries
        .chunks_exact(2)
        .enumerate()
        .filter_map(|(index, pair)| decode_entry(index, &pair[0], &pair[1], resolver))
        .collect();

    Ok(records)
}

fn decode_entry(
    index: usize,
    blob: &Value,
    label: &Value,
    resolver: &impl LocationResolver,
) -> Option<ArchitectureRecord> {
    let (Some(blob), Some(label)) = (blob.as_data(), label.as_string()) else {
        tracing::debug!(index, "Skipping registry entry with unexpected value types");
        return None;
    };

    let architecture = match label.parse::<Architecture>() {
        Ok(architecture) => architecture,
        Err(_) => {
            tracing::debug!(index, label, "Skipping registry entry with unknown architecture");
            return None;
        }
    };

    match resolver.resolve(blob) {
        Some(path) => Some(ArchitectureRecord::new(path, architecture)),
        None => {
            // The application was moved or deleted since it was configured
            tracing::debug!(index, "Skipping registry entry that no longer resolves");
            None
        }
    }
}

/// Architecture recorded for `target`, or [`DEFAULT_ARCHITECTURE`] when none is
pub fn current_architecture(entries: &[ArchitectureRecord], target: &Path) -> Architecture {
    entries
        .iter()
        .find(|record| record.application_path == target)
        .map_or(DEFAULT_ARCHITECTURE, |record| record.architecture)
}

/// The preference write that selects `architecture` for `target`
pub fn build_update_command(target: &Path, architecture: Architecture) -> PreferenceUpdate {
    PreferenceUpdate {
        application_path: target.to_path_buf(),
        architecture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmark::tests::build_bookmark;
    use crate::bookmark::BookmarkResolver;
    use plist::Dictionary;

    fn tree(host_key: &str, entries: Option<Value>) -> Value {
        let mut by_bundle = Dictionary::new();
        if let Some(entries) = entries {
            by_bundle.insert(XCODE_BUNDLE_IDENTIFIER.to_string(), entries);
        }
        let mut root = Dictionary::new();
        root.insert(host_key.to_string(), Value::Dictionary(by_bundle));
        Value::Dictionary(root)
    }

    fn pairs(values: &[(&[u8], &str)]) -> Value {
        Value::Array(
            values
                .iter()
                .flat_map(|(blob, label)| [Value::Data(blob.to_vec()), Value::String(label.to_string())])
                .collect(),
        )
    }

    /// Resolves `A`, `B` and `C` to fixed paths and anything else to nothing
    fn synthetic(blob: &[u8]) -> Option<PathBuf> {
        match blob {
            b"A" => Some(PathBuf::from("/Apps/A.app")),
            b"B" => Some(PathBuf::from("/Apps/B.app")),
            b"C" => Some(PathBuf::from("/Apps/C.app")),
            _ => None,
        }
    }

    #[test]
    fn test_current_architecture_defaults_to_arm64() {
        assert_eq!(
            current_architecture(&[], Path::new("/Applications/Xcode.app")),
            Architecture::Arm64
        );
    }

    #[test]
    fn test_current_architecture_matches_path() {
        let entries = [ArchitectureRecord::new("/Applications/Xcode.app", Architecture::X86_64)];
        assert_eq!(
            current_architecture(&entries, Path::new("/Applications/Xcode.app")),
            Architecture::X86_64
        );
        assert_eq!(
            current_architecture(&entries, Path::new("/Applications/Xcode-beta.app")),
            Architecture::Arm64
        );
    }

    #[test]
    fn test_current_architecture_first_match_wins() {
        let entries = [
            ArchitectureRecord::new("/Applications/Xcode-13.app", Architecture::Arm64),
            ArchitectureRecord::new("/Applications/Xcode.app", Architecture::X86_64),
            ArchitectureRecord::new("/Applications/Xcode.app", Architecture::Arm64),
        ];
        assert_eq!(
            current_architecture(&entries, Path::new("/Applications/Xcode.app")),
            Architecture::X86_64
        );
    }

    #[test]
    fn test_decode_skips_bad_labels_and_stale_bookmarks() {
        let tree = tree(
            "Architectures for arm64",
            Some(pairs(&[
                (&b"A"[..], "x86_64"),
                (&b"B"[..], "unknown_arch"),
                (&b"C"[..], "arm64"),
                (&b"deleted"[..], "x86_64"),
            ])),
        );

        let records = decode_registry(&tree, &RegistryKeys::default(), &synthetic).unwrap();
        assert_eq!(
            records,
            vec![
                ArchitectureRecord::new("/Apps/A.app", Architecture::X86_64),
                ArchitectureRecord::new("/Apps/C.app", Architecture::Arm64),
            ]
        );
    }

    #[test]
    fn test_decode_skips_unexpected_value_types() {
        let tree = tree(
            "Architectures for arm64",
            Some(Value::Array(vec![
                Value::String("A".into()),
                Value::String("x86_64".into()),
                Value::Data(b"C".to_vec()),
                Value::Boolean(false),
                Value::Data(b"A".to_vec()),
                Value::String("arm64".into()),
            ])),
        );

        let records = decode_registry(&tree, &RegistryKeys::default(), &synthetic).unwrap();
        assert_eq!(records, vec![ArchitectureRecord::new("/Apps/A.app", Architecture::Arm64)]);
    }

    #[test]
    fn test_decode_missing_host_key() {
        let tree = tree("Architectures for x86_64", Some(pairs(&[(&b"A"[..], "x86_64")])));
        let err = decode_registry(&tree, &RegistryKeys::default(), &synthetic).unwrap_err();
        assert!(matches!(err, ArchError::InvalidRegistry(message) if message.contains("Architectures for arm64")));
    }

    #[test]
    fn test_decode_wrong_shapes() {
        let not_a_dictionary = Value::Array(Vec::new());
        assert!(matches!(
            decode_registry(&not_a_dictionary, &RegistryKeys::default(), &synthetic),
            Err(ArchError::InvalidRegistry(_))
        ));

        let mut root = Dictionary::new();
        root.insert("Architectures for arm64".into(), Value::String("oops".into()));
        assert!(matches!(
            decode_registry(&Value::Dictionary(root), &RegistryKeys::default(), &synthetic),
            Err(ArchError::InvalidRegistry(_))
        ));

        let tree = tree("Architectures for arm64", Some(Value::Boolean(true)));
        assert!(matches!(
            decode_registry(&tree, &RegistryKeys::default(), &synthetic),
            Err(ArchError::InvalidRegistry(_))
        ));
    }

    #[test]
    fn test_decode_odd_length() {
        let tree = tree(
            "Architectures for arm64",
            Some(Value::Array(vec![
                Value::Data(b"A".to_vec()),
                Value::String("x86_64".into()),
                Value::Data(b"C".to_vec()),
            ])),
        );
        let err = decode_registry(&tree, &RegistryKeys::default(), &synthetic).unwrap_err();
        assert!(matches!(err, ArchError::InvalidRegistry(message) if message.contains("3 values")));
    }

    #[test]
    fn test_decode_unconfigured_application() {
        let tree = tree("Architectures for arm64", None);
        let records = decode_registry(&tree, &RegistryKeys::default(), &synthetic).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_decode_other_bundle_and_host() {
        let mut by_bundle = Dictionary::new();
        by_bundle.insert("com.apple.dt.Xcode-beta".into(), pairs(&[(&b"B"[..], "x86_64")]));
        let mut root = Dictionary::new();
        root.insert("Architectures for x86_64".into(), Value::Dictionary(by_bundle));

        let keys = RegistryKeys::new(Architecture::X86_64, "com.apple.dt.Xcode-beta");
        let records = decode_registry(&Value::Dictionary(root), &keys, &synthetic).unwrap();
        assert_eq!(records, vec![ArchitectureRecord::new("/Apps/B.app", Architecture::X86_64)]);
    }

    #[test]
    fn test_decode_real_bookmarks() {
        let xcode = build_bookmark(&["Applications", "Xcode.app"]);
        let removed = build_bookmark(&["Applications", "Xcode-13.4.app"]);
        let tree = tree(
            "Architectures for arm64",
            Some(pairs(&[(removed.as_slice(), "arm64"), (xcode.as_slice(), "x86_64")])),
        );

        let resolver =
            BookmarkResolver::with_existence_check(|path: &Path| path == Path::new("/Applications/Xcode.app"));
        let records = decode_registry(&tree, &RegistryKeys::default(), &resolver).unwrap();

        assert_eq!(records, vec![ArchitectureRecord::new("/Applications/Xcode.app", Architecture::X86_64)]);
        assert_eq!(
            current_architecture(&records, Path::new("/Applications/Xcode.app")),
            Architecture::X86_64
        );
    }

    #[test]
    fn test_build_update_command() {
        let update = build_update_command(Path::new("/Applications/Xcode.app"), Architecture::X86_64);
        assert_eq!(
            update,
            PreferenceUpdate {
                application_path: PathBuf::from("/Applications/Xcode.app"),
                architecture: Architecture::X86_64,
            }
        );
    }
}
