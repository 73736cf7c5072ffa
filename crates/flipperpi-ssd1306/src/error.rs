//! Error types for SSD1306 operations

use thiserror::Error;

/// SSD1306 specific errors
#[derive(Debug, Error)]
pub enum Ssd1306Error {
    /// Failed to open the I2C adapter
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to select the slave address
    #[error("Failed to select I2C address 0x{addr:02X}: {source}")]
    SetAddressFailed {
        addr: u16,
        #[source]
        source: std::io::Error,
    },

    /// I2C write failed
    #[error("I2C write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for SSD1306 operations
pub type Result<T> = std::result::Result<T, Ssd1306Error>;

impl From<Ssd1306Error> for flipperpi_core::Error {
    fn from(e: Ssd1306Error) -> Self {
        flipperpi_core::Error::backend("display", e)
    }
}
