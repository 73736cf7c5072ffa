//! WiFi scanning with `iwlist`

use crate::runner::{CommandRunner, SystemRunner};
use flipperpi_core::error::{Error, Result};
use flipperpi_core::parse::parse_iwlist;
use flipperpi_core::{WifiNetwork, WifiScanner};

/// Default wireless interface on a Raspberry Pi
pub const DEFAULT_INTERFACE: &str = "wlan0";

/// WiFi scanner running `iwlist <interface> scan`
pub struct IwlistScanner<R: CommandRunner = SystemRunner> {
    interface: String,
    runner: R,
}

impl IwlistScanner {
    /// Create a scanner for `interface` using the host's `iwlist`
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_runner(interface, SystemRunner)
    }
}

impl<R: CommandRunner> IwlistScanner<R> {
    /// Create a scanner that runs commands through `runner`
    pub fn with_runner(interface: impl Into<String>, runner: R) -> Self {
        Self {
            interface: interface.into(),
            runner,
        }
    }

    /// Interface being scanned
    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl<R: CommandRunner> WifiScanner for IwlistScanner<R> {
    fn scan(&mut self) -> Result<Vec<WifiNetwork>> {
        let output = self.runner.run("iwlist", &[&self.interface, "scan"])?;
        let networks = parse_iwlist(&output);
        log::debug!(
            "iwlist: {} network(s) on {}",
            networks.len(),
            self.interface
        );
        Ok(networks)
    }
}

/// Parse `iwlist` backend options
///
/// Supported options:
/// - `iface=wlan0` (or `interface=`) - wireless interface to scan
pub fn parse_options(options: &[(&str, &str)]) -> Result<String> {
    let mut interface = DEFAULT_INTERFACE.to_string();

    for &(key, value) in options {
        match key {
            "iface" | "interface" => {
                if value.is_empty() || value.contains(char::is_whitespace) {
                    return Err(Error::Parse(format!("Invalid interface name: '{}'", value)));
                }
                interface = value.to_string();
            }
            _ => {
                log::warn!("iwlist: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(interface)
}
