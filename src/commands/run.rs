//! Continuous scan command

use super::{open_full, CmdResult};
use crate::config::Config;
use crate::signal;
use flipperpi_device::{ContinuousScanner, Peripheral};
use std::time::Duration;

/// Scan until interrupted (or for `cycles` cycles)
pub fn cmd_run(config: &Config, cycles: Option<u64>, interval: Option<u64>) -> CmdResult {
    let device = open_full(config)?;

    let present: Vec<&str> = Peripheral::ALL
        .into_iter()
        .filter(|p| device.has(*p))
        .map(Peripheral::as_str)
        .collect();
    log::info!("Peripherals: {}", present.join(", "));

    let mut timing = config.timing();
    if let Some(secs) = interval {
        timing.interval = Duration::from_secs(secs);
    }

    let scanner = ContinuousScanner::start(device, timing, cycles)?;
    println!("Scanning, press Ctrl-C to stop");

    while !scanner.is_finished() {
        if signal::sleep(Duration::from_millis(200)) {
            println!("\nShutting down...");
            scanner.stop();
            break;
        }
    }

    let (mut device, summary) = scanner.join()?;
    device.cleanup();

    if let Some(report) = &summary.last {
        println!(
            "Last scan: {} WiFi network(s), {} Bluetooth device(s)",
            report.wifi.len(),
            report.bluetooth.len()
        );
    }
    if summary.errors > 0 {
        log::warn!("{} of {} cycle(s) failed", summary.errors, summary.cycles);
    }
    Ok(())
}
