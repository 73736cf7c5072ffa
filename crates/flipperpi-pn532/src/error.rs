//! Error types for PN532 operations

use thiserror::Error;

/// PN532 specific errors
#[derive(Debug, Error)]
pub enum Pn532Error {
    /// No answer within the allotted time
    #[error("Communication timeout")]
    Timeout,

    /// The chip did not acknowledge a command
    #[error("No ACK for command 0x{0:02X}")]
    NoAck(u8),

    /// The chip asked for the last frame to be resent
    #[error("NACK received")]
    Nack,

    /// Length or data checksum mismatch
    #[error("Bad {0} checksum")]
    BadChecksum(&'static str),

    /// Frame did not have the expected shape
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The chip reported a syntax error in the last command
    #[error("PN532 reported an application error")]
    ErrorFrame,

    /// Response did not belong to the command that was sent
    #[error("Unexpected response 0x{got:02X} (expected 0x{expected:02X})")]
    UnexpectedResponse { expected: u8, got: u8 },

    /// Command specific status byte was non-zero
    #[error("Command 0x{command:02X} failed with status 0x{status:02X}")]
    CommandFailed { command: u8, status: u8 },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

/// Result type for PN532 operations
pub type Result<T> = std::result::Result<T, Pn532Error>;

impl From<std::io::Error> for Pn532Error {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Pn532Error::Timeout
        } else {
            Pn532Error::IoError(e.to_string())
        }
    }
}

impl From<Pn532Error> for flipperpi_core::Error {
    fn from(e: Pn532Error) -> Self {
        match e {
            Pn532Error::Timeout => flipperpi_core::Error::Timeout,
            e => flipperpi_core::Error::backend("nfc", e),
        }
    }
}
