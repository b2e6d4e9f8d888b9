//! Reading and switching the architecture of the selected Xcode

use crate::architecture::Architecture;
use crate::bookmark::BookmarkResolver;
use crate::error::{ArchError, Result};
use crate::preferences::PreferenceStore;
use crate::registry::{
    build_update_command, current_architecture, decode_registry, ArchitectureRecord, LocationResolver,
    RegistryKeys,
};
use crate::version::Version;
use crate::xcode::Xcode;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use xcode_arch_core::config::XcodeConfig;
use xcode_arch_core::process::CommandRunner;

/// What to do with Xcode once the preference is written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostExecution {
    /// Terminate running instances
    pub kill: bool,
    /// Launch the selected Xcode
    pub launch: bool,
}

/// Architecture the selected Xcode runs with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentArchitecture {
    pub path: PathBuf,
    pub architecture: Architecture,
}

impl fmt::Display for CurrentArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` is running with {}", self.path.display(), self.architecture)
    }
}

/// Whether the selected Xcode can still run under Rosetta
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosettaSupport {
    Supported(Version),
    /// Versions from the cutoff on dropped Rosetta
    Dropped { version: Version, cutoff: Version },
    /// The version could not be determined
    Unknown,
}

impl RosettaSupport {
    pub fn is_supported(&self) -> bool {
        !matches!(self, RosettaSupport::Dropped { .. })
    }

    /// Warning to show the user, if any
    pub fn warning(&self) -> Option<String> {
        match self {
            RosettaSupport::Dropped { version, cutoff } => Some(format!(
                "[WARN] Xcode no longer supports Rosetta since {} and current version is {}.\n\
                 This tool will be EOL when Xcode {} is required for submission to the App Store.",
                cutoff.short(),
                version.short(),
                cutoff.short()
            )),
            _ => None,
        }
    }
}

/// Result of a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchOutcome {
    pub path: PathBuf,
    pub architecture: Architecture,
    /// Version gate result, checked only when switching to Rosetta
    pub rosetta: Option<RosettaSupport>,
    /// Whether a running Xcode was terminated
    pub killed: bool,
    pub launched: bool,
}

impl fmt::Display for SwitchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Set {} for {}", self.architecture, self.path.display())
    }
}

/// Ties Xcode control, the preference store and bookmark resolution together
pub struct Switcher<R, S, L = BookmarkResolver> {
    xcode: Xcode<R>,
    store: S,
    resolver: L,
    bundle_identifier: String,
    rosetta_cutoff: Version,
}

impl<R, S, L> Switcher<R, S, L>
where
    R: CommandRunner,
    S: PreferenceStore,
    L: LocationResolver,
{
    pub fn with_config(runner: R, store: S, resolver: L, config: &XcodeConfig) -> Result<Self> {
        Ok(Self {
            xcode: Xcode::with_config(runner, config),
            store,
            resolver,
            bundle_identifier: config.bundle_identifier.clone(),
            rosetta_cutoff: Version::parse(&config.rosetta_cutoff)?,
        })
    }

    /// Fails on Intel machines, where there is no Rosetta to toggle
    pub fn ensure_native_host(&self) -> Result<Architecture> {
        match self.xcode.host_architecture()? {
            Architecture::X86_64 => Err(ArchError::RunningInX86_64),
            host => Ok(host),
        }
    }

    /// Records stored for Xcode on `host`
    pub fn records(&self, host: Architecture) -> Result<Vec<ArchitectureRecord>> {
        let tree = self.store.read()?;
        let keys = RegistryKeys::new(host, self.bundle_identifier.as_str());
        decode_registry(&tree, &keys, &self.resolver)
    }

    /// Architecture the selected Xcode currently runs with
    pub fn current(&self) -> Result<CurrentArchitecture> {
        let host = self.ensure_native_host()?;
        let path = self.xcode.current_path()?;
        let records = self.records(host)?;
        let architecture = current_architecture(&records, &path);

        tracing::debug!(path = %path.display(), %architecture, records = records.len(), "Resolved architecture");
        Ok(CurrentArchitecture { path, architecture })
    }

    /// Compare the selected Xcode's version against the Rosetta cutoff
    pub fn check_xcode_version(&self) -> RosettaSupport {
        match self.xcode.current_version() {
            Ok(version) if version >= self.rosetta_cutoff => RosettaSupport::Dropped {
                version,
                cutoff: self.rosetta_cutoff.clone(),
            },
            Ok(version) => RosettaSupport::Supported(version),
            Err(err) => {
                tracing::warn!(error = %err, "Could not determine the Xcode version");
                RosettaSupport::Unknown
            }
        }
    }

    /// Set `architecture` for the selected Xcode
    pub fn switch(&self, architecture: Architecture, post: PostExecution) -> Result<SwitchOutcome> {
        self.ensure_native_host()?;
        let path = self.xcode.current_path()?;
        let rosetta = architecture.uses_rosetta().then(|| self.check_xcode_version());

        let update = build_update_command(&path, architecture);
        self.store.write(&update)?;

        let killed = if post.kill { self.xcode.kill()? } else { false };
        if post.launch {
            self.xcode.launch(&path)?;
        }

        Ok(SwitchOutcome {
            path,
            architecture,
            rosetta,
            killed,
            launched: post.launch,
        })
    }
}
