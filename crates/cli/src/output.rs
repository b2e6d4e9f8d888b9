//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output. Colors follow terminal
//! support detection unless overridden with [`set_color`].

use owo_colors::{OwoColorize, Stream};

/// Tone of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Completed successfully
    Success,
    /// Informational
    Info,
    /// Needs the user's attention but did not fail
    Warning,
    /// Failed
    Error,
}

impl Tone {
    fn stream(self) -> Stream {
        match self {
            Tone::Success | Tone::Info => Stream::Stdout,
            Tone::Warning | Tone::Error => Stream::Stderr,
        }
    }
}

/// Force colors on or off, or return to auto-detection with `None`
pub fn set_color(enabled: Option<bool>) {
    match enabled {
        Some(enabled) => owo_colors::set_override(enabled),
        None => owo_colors::unset_override(),
    }
}

/// Render a status line for the given tone
pub fn render(tone: Tone, message: &str) -> String {
    let stream = tone.stream();
    match tone {
        Tone::Success => message.if_supports_color(stream, |t| t.green()).to_string(),
        Tone::Info => message.if_supports_color(stream, |t| t.cyan()).to_string(),
        Tone::Warning => message.if_supports_color(stream, |t| t.yellow()).to_string(),
        Tone::Error => format!(
            "{} {}",
            "error:".if_supports_color(stream, |t| t.red()),
            message
        ),
    }
}

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{}", render(Tone::Success, message));
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{}", render(Tone::Info, message));
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{}", render(Tone::Warning, message));
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{}", render(Tone::Error, message));
    }
}
