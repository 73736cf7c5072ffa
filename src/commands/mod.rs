//! CLI command implementations
//!
//! Every command opens a `DeviceHandle` from the configuration. One-shot
//! commands only open the peripherals they use, so a missing PN532 does not
//! slow down a WiFi scan; `run` opens everything and tolerates absent
//! optional peripherals.

mod buttons;
mod list;
mod nfc;
mod run;
mod scan;

pub use buttons::cmd_buttons;
pub use list::{list_backends, show_config};
pub use nfc::{cmd_emulate, cmd_nfc};
pub use run::cmd_run;
pub use scan::{cmd_bluetooth, cmd_wifi};

use crate::config::Config;
use flipperpi_device::{DeviceHandle, Peripheral};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Result type shared by the command implementations
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open every configured peripheral
fn open_full(config: &Config) -> Result<DeviceHandle, Box<dyn std::error::Error>> {
    let mut device = DeviceHandle::open(&config.backend_specs())?;
    device.set_bluetooth_duration(config.bluetooth_duration());
    Ok(device)
}

/// Open GPIO plus the `needed` peripherals, failing if one is unavailable
fn open_for(
    config: &Config,
    needed: &[Peripheral],
) -> Result<DeviceHandle, Box<dyn std::error::Error>> {
    let mut specs = config.backend_specs();
    for peripheral in Peripheral::ALL {
        if peripheral.is_optional() && !needed.contains(&peripheral) {
            specs.set(peripheral, "none");
        }
    }

    let mut device = DeviceHandle::open(&specs)?;
    device.set_bluetooth_duration(config.bluetooth_duration());

    for &peripheral in needed {
        if !device.has(peripheral) {
            return Err(format!(
                "No {} available (backend '{}'), see --{} and list-backends",
                peripheral,
                specs.get(peripheral),
                peripheral
            )
            .into());
        }
    }
    Ok(device)
}

/// Spinner for operations of unknown length
fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::{Config, DeviceSection};

    /// Configuration with every peripheral on its dummy backend
    pub(crate) fn dummy_config() -> Config {
        let specs = flipperpi_device::BackendSpecs::dummy();
        Config {
            device: DeviceSection {
                gpio: specs.gpio,
                display: specs.display,
                nfc: specs.nfc,
                wifi: specs.wifi,
                bluetooth: specs.bluetooth,
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_open_for_missing_peripheral() {
        let mut config = dummy_config();
        config.device.nfc = "none".to_string();

        let err = open_for(&config, &[Peripheral::Nfc]).err().expect("expected an error");
        let message = err.to_string();
        assert!(message.contains("--nfc"), "{}", message);
        assert!(message.contains("'none'"), "{}", message);
    }

    #[test]
    fn test_open_for_opens_only_needed() {
        let device = open_for(&dummy_config(), &[Peripheral::Nfc]).unwrap();
        assert!(device.has(Peripheral::Gpio));
        assert!(device.has(Peripheral::Nfc));
        assert!(!device.has(Peripheral::Wifi));
        assert!(!device.has(Peripheral::Bluetooth));
        assert!(!device.has(Peripheral::Display));
    }

    #[test]
    fn test_open_for_gpio_only() {
        let device = open_for(&dummy_config(), &[]).unwrap();
        assert!(device.has(Peripheral::Gpio));
        for peripheral in Peripheral::ALL {
            if peripheral.is_optional() {
                assert!(!device.has(peripheral), "{} should be closed", peripheral);
            }
        }
    }

    #[test]
    fn test_open_full_keeps_everything() {
        let device = open_full(&dummy_config()).unwrap();
        for peripheral in Peripheral::ALL {
            assert!(device.has(peripheral), "{} should be open", peripheral);
        }
    }

    #[test]
    fn test_open_for_bad_gpio_is_fatal() {
        let mut config = dummy_config();
        config.device.gpio = "nonexistent".to_string();
        assert!(open_for(&config, &[]).is_err());
    }
}
