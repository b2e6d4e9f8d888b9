//! Core utilities for xcode-arch
//!
//! This crate provides the shared plumbing the switcher and the binary build on:
//!
//! - **Error handling**: errors with codes, context, and recovery suggestions
//! - **Process execution**: a `CommandRunner` capability for external commands
//! - **Configuration**: TOML-based configuration with defaults
//!
//! # Example
//!
//! ```rust,no_run
//! use xcode_arch_core::config::Config;
//! use xcode_arch_core::process::{CommandRunner, SystemRunner};
//!
//! let config = Config::load(None).expect("invalid configuration");
//! let runner = SystemRunner;
//! let result = runner.run("/usr/bin/xcode-select", &["-p"]).expect("xcode-select failed");
//! println!("{} ({})", result.stdout_trimmed(), config.schema.xcode.process_name);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;

pub use error::{Error, ErrorCode, Result, ResultExt};
