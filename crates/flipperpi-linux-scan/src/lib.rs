//! flipperpi-linux-scan - WiFi and Bluetooth scanners for Linux
//!
//! The scanners drive the standard command line tools rather than talking
//! to the kernel directly:
//!
//! - [`IwlistScanner`] runs `iwlist <interface> scan` (wireless-tools)
//! - [`BluezScanner`] runs `hcitool scan` and `sdptool browse` (BlueZ)
//!
//! Output parsing lives in `flipperpi_core::parse`.
//!
//! # System Requirements
//!
//! - `wireless-tools` and `bluez` installed
//! - Root or `CAP_NET_ADMIN`, since `iwlist` only returns cached results
//!   to unprivileged users

pub mod bluetooth;
pub mod runner;
pub mod wifi;

// Re-exports
pub use bluetooth::{inquiry_length, BluezScanner};
pub use runner::{CommandRunner, SystemRunner};
pub use wifi::{IwlistScanner, DEFAULT_INTERFACE};

/// Open an iwlist scanner from backend options and return it boxed
///
/// This is a convenience function for use in the device registry.
pub fn open_iwlist(
    options: &[(&str, &str)],
) -> Result<Box<dyn flipperpi_core::WifiScanner>, Box<dyn std::error::Error>> {
    let interface = wifi::parse_options(options)?;
    log::info!("Using iwlist on {}", interface);
    Ok(Box::new(IwlistScanner::new(interface)))
}

/// Open a BlueZ scanner from backend options and return it boxed
///
/// This is a convenience function for use in the device registry.
pub fn open_bluez(
    options: &[(&str, &str)],
) -> Result<Box<dyn flipperpi_core::BluetoothScanner>, Box<dyn std::error::Error>> {
    let adapter = bluetooth::parse_options(options)?;
    Ok(Box::new(BluezScanner::new(adapter)))
}
