//! Semantic version parsing and ordering
//!
//! Accepts the loose forms tools print (`14.3`, `v2.8.9`) alongside full
//! semantic versions. Pre-releases order by plain string comparison and build
//! metadata never takes part in equality or ordering.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

static VERSION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^v?(?P<major>0|[1-9][0-9]*)",
        r"(?:\.(?P<minor>0|[1-9][0-9]*))?",
        r"(?:\.(?P<patch>0|[1-9][0-9]*))?",
        r"(?:-(?P<pre>(?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*)",
        r"(?:\.(?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
        r"(?:\+(?P<build>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    ))
    .expect("version pattern is valid")
});

/// A version string that could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid version {input:?}: {reason}")]
pub struct ParseError {
    /// The rejected text
    pub input: String,
    /// What was wrong with it
    pub reason: &'static str,
}

impl ParseError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// A semantic version
#[derive(Debug, Clone)]
pub struct Version {
    /// The major version.
    ///
    /// Increments to this component represent incompatible API changes.
    pub major: u64,

    /// The minor version.
    ///
    /// Increments to this component represent backwards-compatible
    /// enhancements.
    pub minor: u64,

    /// The patch version.
    ///
    /// Increments to this component represent backwards-compatible bug fixes.
    pub patch: u64,

    /// The pre-release identifier, marking the version as unstable
    pub pre_release: Option<String>,

    /// The build metadata, ignored when comparing versions
    pub build_metadata: Option<String>,
}

impl Version {
    /// Create a release version from its numeric components
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build_metadata: None,
        }
    }

    /// Attach a pre-release identifier
    pub fn with_pre_release(mut self, pre_release: impl Into<String>) -> Self {
        self.pre_release = Some(pre_release.into());
        self
    }

    /// Attach build metadata
    pub fn with_build_metadata(mut self, build_metadata: impl Into<String>) -> Self {
        self.build_metadata = Some(build_metadata.into());
        self
    }

    /// Parse `[v]MAJOR[.MINOR[.PATCH]][-PRERELEASE][+BUILD]`.
    ///
    /// Missing minor and patch components default to 0.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let captures = VERSION_PATTERN.captures(text).ok_or_else(|| {
            ParseError::new(text, "expected [v]MAJOR[.MINOR[.PATCH]][-PRERELEASE][+BUILD]")
        })?;

        let number = |name: &str| -> Result<u64, ParseError> {
            captures
                .name(name)
                .map_or(Ok(0), |m| m.as_str().parse::<u64>())
                .map_err(|_| ParseError::new(text, "version component is too large"))
        };

        Ok(Self {
            major: number("major")?,
            minor: number("minor")?,
            patch: number("patch")?,
            pre_release: captures.name("pre").map(|m| m.as_str().to_string()),
            build_metadata: captures.name("build").map(|m| m.as_str().to_string()),
        })
    }

    /// The version components, most significant first
    pub fn components(&self) -> [u64; 3] {
        [self.major, self.minor, self.patch]
    }

    /// Human form used in messages: a plain `X.Y.0` release is shown as `X.Y`
    pub fn short(&self) -> String {
        if self.patch == 0 && self.pre_release.is_none() && self.build_metadata.is_none() {
            format!("{}.{}", self.major, self.minor)
        } else {
            self.to_string()
        }
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components().hash(state);
        self.pre_release.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components()
            .cmp(&other.components())
            .then_with(|| match (&self.pre_release, &other.pre_release) {
                (None, None) => Ordering::Equal,
                // A release is newer than any of its pre-releases
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(lhs), Some(rhs)) => lhs.cmp(rhs),
            })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre_release) = &self.pre_release {
            write!(f, "-{}", pre_release)?;
        }
        if let Some(build_metadata) = &self.build_metadata {
            write!(f, "+{}", build_metadata)?;
        }
        Ok(())
    }
}
