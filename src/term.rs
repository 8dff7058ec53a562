//! Terminal styling for progress output.
//!
//! Styling is only applied when the stream is a terminal and `NO_COLOR` is
//! unset, so piped logs stay free of escape codes.

use std::io::IsTerminal;

use crossterm::style::{Attribute, Stylize};

/// Which output stream a piece of text is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Per-stream color support, resolved once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct Palette {
    stdout: bool,
    stderr: bool,
}

impl Palette {
    /// Detect color support for stdout and stderr.
    pub fn detect() -> Self {
        let enabled = std::env::var_os("NO_COLOR").map_or(true, |v| v.is_empty());
        Self {
            stdout: enabled && std::io::stdout().is_terminal(),
            stderr: enabled && std::io::stderr().is_terminal(),
        }
    }

    /// A palette that never emits escape codes.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn supports(&self, stream: Stream) -> bool {
        match stream {
            Stream::Stdout => self.stdout,
            Stream::Stderr => self.stderr,
        }
    }

    pub fn banner(&self, text: &str) -> String {
        if self.stdout {
            text.bold().reverse().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn dim(&self, text: &str) -> String {
        if self.stdout {
            text.dim().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, text: &str) -> String {
        if self.stdout {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn error(&self, text: &str) -> String {
        if self.stderr {
            text.red().to_string()
        } else {
            text.to_string()
        }
    }

    /// Escape sequence that switches `stream` to dim output, if supported.
    pub fn dim_open(&self, stream: Stream) -> String {
        if self.supports(stream) {
            Attribute::Dim.to_string()
        } else {
            String::new()
        }
    }

    /// Escape sequence that restores normal intensity on `stream`.
    pub fn dim_close(&self, stream: Stream) -> String {
        if self.supports(stream) {
            Attribute::NormalIntensity.to_string()
        } else {
            String::new()
        }
    }
}
