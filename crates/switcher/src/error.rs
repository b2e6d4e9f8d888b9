use crate::version::ParseError;
use std::path::PathBuf;
use thiserror::Error;
use xcode_arch_core::error::exit_codes;

pub type Result<T> = std::result::Result<T, ArchError>;

#[derive(Error, Debug)]
pub enum ArchError {
    #[error("Running in `x86_64` arch. This tool supports only `arm64`")]
    RunningInX86_64,

    #[error("Invalid architecture: {0}")]
    InvalidArchitecture(String),

    #[error("Xcode is not installed")]
    UnknownXcodePath,

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{} not found.", .0.display())]
    StoreNotFound(PathBuf),

    #[error("Invalid plist: {0}")]
    InvalidStore(String),

    #[error("Invalid architecture registry: {0}")]
    InvalidRegistry(String),

    #[error("Command execution failed: {0}")]
    ExecutionFailed(#[from] xcode_arch_core::Error),

    #[error("Failed to set architecture preference: {0}")]
    PreferenceWriteFailed(String),

    #[error("Changing architecture preferences is only supported on macOS")]
    UnsupportedPlatform,
}

impl ArchError {
    /// Exit code a CLI should terminate with for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ArchError::InvalidArchitecture(_)
            | ArchError::Parse(_)
            | ArchError::InvalidStore(_)
            | ArchError::InvalidRegistry(_) => exit_codes::VALIDATION_ERROR,
            ArchError::ExecutionFailed(err) => err.code.exit_code(),
            ArchError::RunningInX86_64
            | ArchError::UnknownXcodePath
            | ArchError::StoreNotFound(_)
            | ArchError::PreferenceWriteFailed(_)
            | ArchError::UnsupportedPlatform => exit_codes::PLATFORM_ERROR,
        }
    }
}
