//! Architecture switching for Xcode on Apple silicon
//!
//! This crate provides functionality to:
//! - Parse and compare Xcode versions
//! - Decode the architecture preferences LaunchServices records per application
//! - Read and write those preferences
//! - Locate, terminate and launch the selected Xcode

pub mod architecture;
pub mod bookmark;
pub mod error;
pub mod preferences;
pub mod registry;
pub mod switcher;
pub mod version;
pub mod xcode;

pub use architecture::Architecture;
pub use bookmark::BookmarkResolver;
pub use error::{ArchError, Result};
pub use preferences::{LaunchServicesStore, PreferenceStore};
pub use registry::{
    build_update_command, current_architecture, decode_registry, ArchitectureRecord, LocationResolver,
    PreferenceUpdate, RegistryKeys,
};
pub use switcher::{CurrentArchitecture, PostExecution, RosettaSupport, SwitchOutcome, Switcher};
pub use version::{ParseError, Version};
pub use xcode::Xcode;
