//! User-facing console output

use colored::Colorize;
use std::fmt::Display;

/// Console logger handed to every command invocation.
///
/// `info`, `success` and `verbose` write to stdout; `warn` and `error` to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Logger {
    quiet: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Logger that swallows all output (used by tests)
    pub fn silent() -> Self {
        Self { quiet: true }
    }

    pub fn info(&self, message: impl Display) {
        if !self.quiet {
            println!("{}", message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{}", message.to_string().yellow());
        }
    }

    pub fn error(&self, message: impl Display) {
        if !self.quiet {
            eprintln!("{}", message.to_string().red());
        }
    }

    pub fn success(&self, message: impl Display) {
        if !self.quiet {
            println!("{}", message.to_string().green());
        }
    }

    pub fn verbose(&self, message: impl Display) {
        if !self.quiet {
            println!("{}", message.to_string().cyan());
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
