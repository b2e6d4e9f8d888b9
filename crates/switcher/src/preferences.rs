//! LaunchServices preference store
//!
//! Reading goes through the preferences plist on disk. Writing goes through
//! LaunchServices itself, which owns the file and keeps it in sync with its
//! in-memory state.

use crate::error::{ArchError, Result};
use crate::registry::PreferenceUpdate;
use plist::Value;
use std::path::{Path, PathBuf};
use xcode_arch_core::config::LaunchServicesConfig;

/// Where architecture preferences are read from and written to
pub trait PreferenceStore {
    /// The deserialized preferences tree
    fn read(&self) -> Result<Value>;

    /// Record the architecture for an application
    fn write(&self, update: &PreferenceUpdate) -> Result<()>;
}

impl<S: PreferenceStore + ?Sized> PreferenceStore for &S {
    fn read(&self) -> Result<Value> {
        (**self).read()
    }

    fn write(&self, update: &PreferenceUpdate) -> Result<()> {
        (**self).write(update)
    }
}

/// The current user's LaunchServices preferences
#[derive(Debug, Clone)]
pub struct LaunchServicesStore {
    plist_path: PathBuf,
}

impl LaunchServicesStore {
    pub fn new(plist_path: impl Into<PathBuf>) -> Self {
        Self {
            plist_path: plist_path.into(),
        }
    }

    /// Store at the configured path, or the default one under the home directory
    pub fn from_config(config: &LaunchServicesConfig) -> Result<Self> {
        config
            .resolved_plist_path()
            .map(Self::new)
            .ok_or_else(|| ArchError::InvalidStore("cannot determine the home directory".into()))
    }

    pub fn plist_path(&self) -> &Path {
        &self.plist_path
    }
}

impl PreferenceStore for LaunchServicesStore {
    fn read(&self) -> Result<Value> {
        if !self.plist_path.exists() {
            return Err(ArchError::StoreNotFound(self.plist_path.clone()));
        }
        tracing::debug!(path = %self.plist_path.display(), "Reading LaunchServices preferences");

        Value::from_file(&self.plist_path)
            .map_err(|e| ArchError::InvalidStore(format!("{}: {}", self.plist_path.display(), e)))
    }

    fn write(&self, update: &PreferenceUpdate) -> Result<()> {
        tracing::info!(
            path = %update.application_path.display(),
            architecture = %update.architecture,
            "Setting architecture preference"
        );
        launch_services::set_architecture_preference(update)
    }
}

#[cfg(target_os = "macos")]
mod launch_services {
    use crate::error::{ArchError, Result};
    use crate::registry::PreferenceUpdate;
    use std::ffi::c_void;
    use std::os::unix::ffi::OsStrExt;

    type CFTypeRef = *const c_void;
    type CFAllocatorRef = *const c_void;
    type CFURLRef = *const c_void;
    type CFStringRef = *const c_void;
    type CFIndex = isize;
    type Boolean = u8;

    const K_CF_STRING_ENCODING_UTF8: u32 = 0x0800_0100;

    #[link(name = "CoreFoundation", kind = "framework")]
    unsafe extern "C" {
        fn CFURLCreateFromFileSystemRepresentation(
            allocator: CFAllocatorRef,
            buffer: *const u8,
            buf_len: CFIndex,
            is_directory: Boolean,
        ) -> CFURLRef;

        fn CFStringCreateWithBytes(
            alloc: CFAllocatorRef,
            bytes: *const u8,
            num_bytes: CFIndex,
            encoding: u32,
            is_external_representation: Boolean,
        ) -> CFStringRef;

        fn CFRelease(cf: CFTypeRef);
    }

    #[link(name = "CoreServices", kind = "framework")]
    unsafe extern "C" {
        // Private; backs the "Open using Rosetta" checkbox in Finder.
        fn _LSSetArchitecturePreferenceForApplicationURL(url: CFURLRef, arch: CFStringRef);
    }

    pub(super) fn set_architecture_preference(update: &PreferenceUpdate) -> Result<()> {
        let path = update.application_path.as_os_str().as_bytes();
        let arch = update.architecture.as_str().as_bytes();
        let path_len = CFIndex::try_from(path.len())
            .map_err(|_| ArchError::PreferenceWriteFailed("application path is too long".into()))?;

        // SAFETY: both buffers outlive the calls, lengths match the buffers,
        // and every object created here is released exactly once.
        unsafe {
            let url = CFURLCreateFromFileSystemRepresentation(std::ptr::null(), path.as_ptr(), path_len, 1);
            if url.is_null() {
                return Err(ArchError::PreferenceWriteFailed(format!(
                    "cannot create a URL for {}",
                    update.application_path.display()
                )));
            }

            let label = CFStringCreateWithBytes(
                std::ptr::null(),
                arch.as_ptr(),
                arch.len() as CFIndex,
                K_CF_STRING_ENCODING_UTF8,
                0,
            );
            if label.is_null() {
                CFRelease(url);
                return Err(ArchError::PreferenceWriteFailed(format!(
                    "cannot create a string for {}",
                    update.architecture
                )));
            }

            _LSSetArchitecturePreferenceForApplicationURL(url, label);

            CFRelease(label);
            CFRelease(url);
        }
        Ok(())
    }
}

#[cfg(not(target_os = "macos"))]
mod launch_services {
    use crate::error::{ArchError, Result};
    use crate::registry::PreferenceUpdate;

    pub(super) fn set_architecture_preference(_update: &PreferenceUpdate) -> Result<()> {
        Err(ArchError::UnsupportedPlatform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Dictionary;

    #[test]
    fn test_read_missing_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("com.apple.LaunchServices.plist");

        let err = LaunchServicesStore::new(&path).read().unwrap_err();
        assert!(matches!(err, ArchError::StoreNotFound(missing) if missing == path));
    }

    #[test]
    fn test_read_invalid_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("com.apple.LaunchServices.plist");
        std::fs::write(&path, "<?xml version=\"1.0\"?><plist><dict><key>unterminated").unwrap();

        let err = LaunchServicesStore::new(&path).read().unwrap_err();
        assert!(matches!(err, ArchError::InvalidStore(_)));
    }

    #[test]
    fn test_read_binary_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("com.apple.LaunchServices.plist");

        let mut by_bundle = Dictionary::new();
        by_bundle.insert(
            "com.apple.dt.Xcode".into(),
            Value::Array(vec![Value::Data(vec![1, 2, 3]), Value::String("x86_64".into())]),
        );
        let mut root = Dictionary::new();
        root.insert("Architectures for arm64".into(), Value::Dictionary(by_bundle));
        let tree = Value::Dictionary(root);
        tree.to_file_binary(&path).unwrap();

        let store = LaunchServicesStore::new(&path);
        assert_eq!(store.plist_path(), path.as_path());
        assert_eq!(store.read().unwrap(), tree);
    }

    #[test]
    fn test_from_config_uses_explicit_path() {
        let config = LaunchServicesConfig {
            plist_path: Some(PathBuf::from("/tmp/custom.plist")),
        };
        let store = LaunchServicesStore::from_config(&config).unwrap();
        assert_eq!(store.plist_path(), Path::new("/tmp/custom.plist"));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_write_is_unsupported_off_macos() {
        let store = LaunchServicesStore::new("/tmp/unused.plist");
        let update = crate::registry::build_update_command(
            Path::new("/Applications/Xcode.app"),
            crate::architecture::Architecture::X86_64,
        );
        assert!(matches!(store.write(&update), Err(ArchError::UnsupportedPlatform)));
    }
}
