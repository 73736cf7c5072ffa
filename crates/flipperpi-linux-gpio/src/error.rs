//! Error types for Linux GPIO operations

use thiserror::Error;

/// Linux GPIO specific errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to set GPIO line value
    #[error("Failed to set GPIO line {line}: {source}")]
    SetValueFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to get GPIO line values
    #[error("Failed to read GPIO lines: {0}")]
    GetValueFailed(#[source] gpiocdev::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The same line was assigned twice
    #[error("GPIO line {0} is assigned more than once")]
    DuplicateLine(u32),

    /// Both dev= and gpiochip= were given
    #[error("Only one of 'dev' or 'gpiochip' can be specified")]
    ConflictingDevice,
}

/// Result type for Linux GPIO operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;

impl From<LinuxGpioError> for flipperpi_core::Error {
    fn from(e: LinuxGpioError) -> Self {
        flipperpi_core::Error::backend("gpio", e)
    }
}
