//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location of the LaunchServices preferences, relative to the home directory
pub const LAUNCH_SERVICES_PLIST: &str =
    "Library/Preferences/com.apple.LaunchServices/com.apple.LaunchServices.plist";

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigSchema {
    /// `[general]`
    #[serde(default)]
    pub general: GeneralConfig,

    /// `[xcode]`
    #[serde(default)]
    pub xcode: XcodeConfig,

    /// `[launch_services]`
    #[serde(default)]
    pub launch_services: LaunchServicesConfig,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Default log level, overridden by `RUST_LOG` and `-v`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// How the Xcode application is identified and controlled
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct XcodeConfig {
    /// Process name passed to `killall`
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Bundle identifier the architecture preferences are recorded under
    #[serde(default = "default_bundle_identifier")]
    pub bundle_identifier: String,

    /// Milliseconds to wait after terminating Xcode
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// First Xcode version that no longer runs under Rosetta
    #[serde(default = "default_rosetta_cutoff")]
    pub rosetta_cutoff: String,
}

impl Default for XcodeConfig {
    fn default() -> Self {
        Self {
            process_name: default_process_name(),
            bundle_identifier: default_bundle_identifier(),
            kill_grace_ms: default_kill_grace_ms(),
            rosetta_cutoff: default_rosetta_cutoff(),
        }
    }
}

fn default_process_name() -> String {
    "Xcode".to_string()
}

fn default_bundle_identifier() -> String {
    "com.apple.dt.Xcode".to_string()
}

fn default_kill_grace_ms() -> u64 {
    5
}

fn default_rosetta_cutoff() -> String {
    "14.3".to_string()
}

/// LaunchServices preference store location
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LaunchServicesConfig {
    /// Explicit plist path; defaults to the current user's preferences
    #[serde(default)]
    pub plist_path: Option<PathBuf>,
}

impl LaunchServicesConfig {
    /// The plist path to read, falling back to `~/Library/Preferences/...`
    pub fn resolved_plist_path(&self) -> Option<PathBuf> {
        self.plist_path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(LAUNCH_SERVICES_PLIST)))
    }
}
