//! Error types for flipperpi-core
//!
//! Backend crates carry their own error enums and convert into this type at
//! the trait boundary, so the device layer only ever sees [`Error`].

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// User supplied tag data could not be parsed
    #[error("Invalid tag data '{data}': {reason}")]
    InvalidTagData {
        /// The rejected input
        data: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// Tool output or a configuration value could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// An external program could not be started
    #[error("Failed to run `{program}`: {source}")]
    CommandSpawn {
        /// Program name
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// An external program exited unsuccessfully
    #[error("`{program}` exited with status {status}: {stderr}")]
    CommandFailed {
        /// Program name
        program: String,
        /// Exit code (-1 when killed by a signal)
        status: i32,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// A hardware backend reported an error
    #[error("{peripheral} error: {message}")]
    Backend {
        /// Peripheral kind ("gpio", "display", "nfc", ...)
        peripheral: &'static str,
        /// Backend specific description
        message: String,
    },

    /// The peripheral did not answer in time
    #[error("Operation timed out")]
    Timeout,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a [`Error::Backend`] from any displayable backend error
    pub fn backend(peripheral: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Backend {
            peripheral,
            message: err.to_string(),
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
