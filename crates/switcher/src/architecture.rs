//! CPU architectures an application can be launched under

use crate::error::ArchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instruction set an application runs under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Architecture {
    /// Intel, translated by Rosetta on Apple silicon
    #[serde(rename = "x86_64")]
    #[value(name = "x86_64")]
    X86_64,
    /// Native Apple silicon
    #[serde(rename = "arm64")]
    #[value(name = "arm64")]
    Arm64,
}

impl Architecture {
    /// Every supported architecture
    pub const ALL: [Architecture; 2] = [Architecture::X86_64, Architecture::Arm64];

    /// The label LaunchServices and `uname -m` use
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Arm64 => "arm64",
        }
    }

    /// Whether selecting this architecture means "Open using Rosetta"
    pub fn uses_rosetta(self) -> bool {
        self == Architecture::X86_64
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = ArchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Architecture::ALL
            .into_iter()
            .find(|arch| arch.as_str() == s)
            .ok_or_else(|| ArchError::InvalidArchitecture(s.to_string()))
    }
}
