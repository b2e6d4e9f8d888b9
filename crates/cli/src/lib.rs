//! CLI utilities for xcode-arch
//!
//! Provides shared CLI functionality:
//! - Colored status messages
//! - Color enable/disable handling

#![warn(missing_docs)]

pub mod output;
