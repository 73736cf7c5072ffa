//! NFC read and RFID emulation commands

use super::{open_for, CmdResult};
use crate::config::Config;
use crate::signal;
use flipperpi_core::{EmulationOutcome, NfcRead};
use flipperpi_device::Peripheral;
use std::time::{Duration, Instant};

/// Delay between polls while waiting for a tag
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Read a tag, polling for up to `wait_secs` seconds
pub fn cmd_nfc(config: &Config, wait_secs: u64, json: bool) -> CmdResult {
    let mut device = open_for(config, &[Peripheral::Nfc])?;
    // None: the wait is too long to represent, poll until a tag or Ctrl-C
    let deadline = Instant::now().checked_add(Duration::from_secs(wait_secs));

    if wait_secs > 0 {
        println!("Waiting up to {}s for a tag...", wait_secs);
    }

    let read = loop {
        let read = device.read_nfc()?;
        let expired = deadline.map_or(false, |d| Instant::now() >= d);
        if matches!(read, NfcRead::Tag(_)) || expired {
            break read;
        }
        if signal::sleep(POLL_INTERVAL) {
            break read;
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&read)?);
    } else {
        println!("{}", read);
    }
    Ok(())
}

/// Emulate `tag` until a reader activates it or the backend gives up
pub fn cmd_emulate(config: &Config, tag: &str) -> CmdResult {
    let mut device = open_for(config, &[Peripheral::Nfc])?;

    match device.rfid_emulate(tag)? {
        EmulationOutcome::Activated => println!("Tag {} was read by a reader", tag),
        EmulationOutcome::NoReader => println!("No reader activated tag {}", tag),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::dummy_config;

    #[test]
    fn test_nfc_with_unbounded_wait() {
        let mut config = dummy_config();
        config.device.nfc = "dummy:tag=DEADBEEF".to_string();
        cmd_nfc(&config, u64::MAX, true).unwrap();
    }

    #[test]
    fn test_nfc_without_tag_returns_after_wait() {
        cmd_nfc(&dummy_config(), 0, false).unwrap();
    }

    #[test]
    fn test_nfc_needs_reader() {
        let mut config = dummy_config();
        config.device.nfc = "none".to_string();
        assert!(cmd_nfc(&config, 0, false).is_err());
        assert!(cmd_emulate(&config, "08A1B2C3").is_err());
    }

    #[test]
    fn test_emulate_dummy() {
        cmd_emulate(&dummy_config(), "08:A1:B2:C3").unwrap();
        assert!(cmd_emulate(&dummy_config(), "not hex").is_err());
    }
}
