//! Bluetooth classic scanning with BlueZ `hcitool` and `sdptool`

use crate::runner::{CommandRunner, SystemRunner};
use flipperpi_core::error::{Error, Result};
use flipperpi_core::parse::{is_bdaddr, parse_hcitool_scan, parse_sdptool_browse};
use flipperpi_core::{BluetoothDevice, BluetoothScanner, BluetoothService};
use std::time::Duration;

/// Length of one inquiry unit in milliseconds (HCI spec: 1.28 s)
const INQUIRY_UNIT_MS: u128 = 1280;
/// Largest inquiry length the controller accepts
const MAX_INQUIRY_UNITS: u128 = 0x30;

/// Number of 1.28 s inquiry units covering `duration` (at least one)
pub fn inquiry_length(duration: Duration) -> u8 {
    let units = duration.as_millis().div_ceil(INQUIRY_UNIT_MS);
    units.clamp(1, MAX_INQUIRY_UNITS) as u8
}

/// Bluetooth scanner running the BlueZ command line tools
pub struct BluezScanner<R: CommandRunner = SystemRunner> {
    adapter: Option<String>,
    runner: R,
}

impl BluezScanner {
    /// Create a scanner using the host's BlueZ tools
    ///
    /// `adapter` selects a controller (e.g. "hci0"), `None` uses the default.
    pub fn new(adapter: Option<String>) -> Self {
        Self::with_runner(adapter, SystemRunner)
    }
}

impl<R: CommandRunner> BluezScanner<R> {
    /// Create a scanner that runs commands through `runner`
    pub fn with_runner(adapter: Option<String>, runner: R) -> Self {
        Self { adapter, runner }
    }
}

impl<R: CommandRunner> BluetoothScanner for BluezScanner<R> {
    fn discover(&mut self, duration: Duration) -> Result<Vec<BluetoothDevice>> {
        let length = format!("--length={}", inquiry_length(duration));
        let mut args = Vec::new();
        if let Some(adapter) = &self.adapter {
            args.extend_from_slice(&["-i", adapter.as_str()]);
        }
        args.extend_from_slice(&["scan", length.as_str()]);
        let output = self.runner.run("hcitool", &args)?;
        let devices = parse_hcitool_scan(&output);
        log::debug!("hcitool: {} device(s) found", devices.len());
        Ok(devices)
    }

    fn find_services(&mut self, address: &str) -> Result<Vec<BluetoothService>> {
        if !is_bdaddr(address) {
            return Err(Error::Parse(format!(
                "Invalid Bluetooth address: '{}'",
                address
            )));
        }
        let output = self.runner.run("sdptool", &["browse", address])?;
        let services = parse_sdptool_browse(&output);
        log::debug!("sdptool: {} service(s) on {}", services.len(), address);
        Ok(services)
    }
}

/// Parse `bluez` backend options
///
/// Supported options:
/// - `adapter=hci0` (or `hci=0`) - controller to use for inquiries
pub fn parse_options(options: &[(&str, &str)]) -> Result<Option<String>> {
    let mut adapter = None;

    for &(key, value) in options {
        match key {
            "adapter" => {
                if !value.starts_with("hci") {
                    return Err(Error::Parse(format!("Invalid adapter: '{}'", value)));
                }
                adapter = Some(value.to_string());
            }
            "hci" => {
                let index: u8 = value
                    .parse()
                    .map_err(|_| Error::Parse(format!("Invalid hci index: '{}'", value)))?;
                adapter = Some(format!("hci{}", index));
            }
            _ => {
                log::warn!("bluez: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(adapter)
}
