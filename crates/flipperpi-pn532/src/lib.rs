//! flipperpi-pn532 - PN532 NFC controller support
//!
//! This crate talks to an NXP PN532 over its HSU (UART) link. The chip is
//! used both as an ISO14443A reader and as a card emulator.
//!
//! # Example
//!
//! ```no_run
//! use flipperpi_core::{NfcRead, NfcReader};
//! use flipperpi_pn532::{parse_options, Pn532};
//!
//! let config = parse_options(&[("dev", "/dev/ttyS0")])?;
//! let mut pn532 = Pn532::open(&config)?;
//! if let NfcRead::Tag(tag) = pn532.read()? {
//!     println!("UID {}", tag.uid_hex());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Emulation limits
//!
//! In target mode the PN532 fixes the first UID byte to 0x08 and lets the
//! host choose the remaining three, so only 4-byte UIDs starting with 0x08
//! are reproduced exactly.

pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports
pub use device::{parse_options, Pn532, Pn532Config, DEFAULT_EMULATE_TIMEOUT};
pub use error::{Pn532Error, Result};
pub use transport::serial::SerialTransport;
pub use transport::Transport;

/// Open a PN532 from backend options and return it boxed
///
/// This is a convenience function for use in the device registry.
pub fn open_pn532(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn flipperpi_core::NfcFrontend>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let pn532 = Pn532::open(&config)?;
    Ok(Box::new(pn532))
}
