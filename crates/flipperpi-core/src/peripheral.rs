//! Peripheral trait definitions
//!
//! Every piece of hardware the device talks to sits behind one of these
//! traits. Backend crates (GPIO, SSD1306, PN532, Linux scanners, dummy)
//! implement them, and the device layer only ever holds boxed trait objects.
//!
//! All traits require `Send` because the continuous scanner moves the whole
//! device onto a background thread.

use crate::error::Result;
use crate::types::{
    BluetoothDevice, BluetoothService, ButtonState, EmulationOutcome, NfcRead, RfidTag,
    WifiNetwork,
};
use std::time::Duration;

/// Status LED
pub trait StatusLed: Send {
    /// Switch the LED on or off
    fn set(&mut self, on: bool) -> Result<()>;

    /// Last state written with [`StatusLed::set`]
    fn is_on(&self) -> bool;
}

/// Push button bank
pub trait Buttons: Send {
    /// Sample every configured button
    fn read(&mut self) -> Result<Vec<ButtonState>>;
}

/// Monochrome display with a text API
///
/// Drivers keep a [`crate::FrameBuffer`]; `clear` and `text` only touch that
/// buffer, and nothing reaches the panel until [`Display::flush`].
pub trait Display: Send {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Clear the framebuffer
    fn clear(&mut self);

    /// Draw `text` with its top-left corner at (`x`, `y`)
    fn text(&mut self, text: &str, x: i32, y: i32, on: bool);

    /// Push the framebuffer to the panel
    fn flush(&mut self) -> Result<()>;
}

/// WiFi network scanner
pub trait WifiScanner: Send {
    /// Scan for networks in range
    fn scan(&mut self) -> Result<Vec<WifiNetwork>>;
}

/// Bluetooth classic scanner
pub trait BluetoothScanner: Send {
    /// Run an inquiry for `duration` and return the devices found, with names
    fn discover(&mut self, duration: Duration) -> Result<Vec<BluetoothDevice>>;

    /// Browse the service records of one device
    fn find_services(&mut self, address: &str) -> Result<Vec<BluetoothService>>;
}

/// NFC tag reader
pub trait NfcReader: Send {
    /// Poll once for a tag in the field
    fn read(&mut self) -> Result<NfcRead>;
}

/// RFID/NFC tag emulator
pub trait RfidEmulator: Send {
    /// Present `tag` to a nearby reader
    fn emulate(&mut self, tag: &RfidTag) -> Result<EmulationOutcome>;
}

/// An NFC front end that can both read and emulate tags
///
/// Readers like the PN532 do both over the same link, so the device holds
/// one boxed `NfcFrontend` rather than two handles to the same port.
pub trait NfcFrontend: NfcReader + RfidEmulator {}

impl<T: NfcReader + RfidEmulator> NfcFrontend for T {}
