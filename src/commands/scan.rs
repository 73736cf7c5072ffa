//! One-shot WiFi and Bluetooth scans

use super::{open_for, spinner, CmdResult};
use crate::config::Config;
use flipperpi_core::{BluetoothDevice, WifiNetwork};
use flipperpi_device::Peripheral;
use std::time::Duration;

/// Scan WiFi once and print the networks
pub fn cmd_wifi(config: &Config, json: bool) -> CmdResult {
    let mut device = open_for(config, &[Peripheral::Wifi])?;

    let pb = spinner("Scanning WiFi...")?;
    let networks = device.wifi_scan();
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&networks)?);
    } else {
        print_networks(&networks);
    }
    Ok(())
}

/// Scan Bluetooth once and print the devices
pub fn cmd_bluetooth(
    config: &Config,
    duration: Option<u64>,
    services: bool,
    json: bool,
) -> CmdResult {
    let mut device = open_for(config, &[Peripheral::Bluetooth])?;
    if let Some(secs) = duration {
        if secs == 0 {
            return Err("Inquiry duration must be at least 1 second".into());
        }
        device.set_bluetooth_duration(Duration::from_secs(secs));
    }

    let pb = spinner("Scanning Bluetooth...")?;
    let devices = if services {
        device.advanced_bluetooth_scan()
    } else {
        device.bluetooth_scan()
    };
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else {
        print_devices(&devices, services);
    }
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_networks(networks: &[WifiNetwork]) {
    println!("Found {} network(s)", networks.len());
    if networks.is_empty() {
        return;
    }
    println!();
    println!(
        "{:<32} {:<17} {:>3} {:>7} {:>8} {:>4}",
        "SSID", "BSSID", "CH", "QUALITY", "SIGNAL", "ENC"
    );
    println!("{}", "-".repeat(76));

    for net in networks {
        let ssid = if net.ssid.is_empty() {
            "<hidden>"
        } else {
            &net.ssid
        };
        let quality = net.quality.map(|(q, max)| format!("{}/{}", q, max));
        let signal = net.signal_dbm.map(|dbm| format!("{} dBm", dbm));
        let enc = net.encrypted.map(|e| if e { "on" } else { "off" });
        println!(
            "{:<32} {:<17} {:>3} {:>7} {:>8} {:>4}",
            ssid,
            or_dash(net.bssid.as_deref()),
            or_dash(net.channel),
            or_dash(quality),
            or_dash(signal),
            or_dash(enc)
        );
    }
}

fn print_devices(devices: &[BluetoothDevice], services: bool) {
    println!("Found {} device(s)", devices.len());
    if devices.is_empty() {
        return;
    }
    println!();

    for dev in devices {
        println!("{}  {}", dev.address, dev.name.as_deref().unwrap_or("(unknown)"));
        if !services {
            continue;
        }
        if dev.services.is_empty() {
            println!("    no services");
        }
        for svc in &dev.services {
            let mut line = format!("    {}", svc.name.as_deref().unwrap_or("(unnamed)"));
            if let Some(proto) = &svc.protocol {
                line.push_str(&format!(" [{}", proto));
                if let Some(ch) = svc.channel {
                    line.push_str(&format!(" channel {}", ch));
                }
                line.push(']');
            }
            println!("{}", line);
        }
    }
}
