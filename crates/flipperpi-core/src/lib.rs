//! flipperpi-core - Core library for the flipperpi hardware multi-tool
//!
//! This crate holds everything that does not touch real hardware:
//!
//! - The peripheral traits ([`StatusLed`], [`Buttons`], [`Display`],
//!   [`WifiScanner`], [`BluetoothScanner`], [`NfcReader`], [`RfidEmulator`])
//!   implemented by the backend crates
//! - The data types exchanged with those backends
//! - Parsers for the output of the Linux tools used by the scanners
//! - A 1 bit-per-pixel framebuffer with a built-in 5x7 font, shared by all
//!   display drivers
//!
//! # Example
//!
//! ```
//! use flipperpi_core::parse::parse_iwlist;
//!
//! let output = r#"
//! wlan0     Scan completed :
//!           Cell 01 - Address: 00:11:22:33:44:55
//!                     Channel:6
//!                     ESSID:"HomeNet"
//! "#;
//! let networks = parse_iwlist(output);
//! assert_eq!(networks[0].ssid, "HomeNet");
//! assert_eq!(networks[0].channel, Some(6));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod display;
pub mod error;
pub mod parse;
pub mod peripheral;
pub mod types;

pub use display::{FrameBuffer, CHAR_HEIGHT, CHAR_WIDTH};
pub use error::{Error, Result};
pub use peripheral::{
    BluetoothScanner, Buttons, Display, NfcFrontend, NfcReader, RfidEmulator, StatusLed,
    WifiScanner,
};
pub use types::*;
