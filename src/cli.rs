//! CLI argument parsing

use clap::{Parser, Subcommand};
use flipperpi_device::{backend_names_short, Peripheral};
use std::path::PathBuf;

/// Generate dynamic help text for a backend override
fn backend_help(peripheral: Peripheral) -> String {
    format!(
        "{} backend, e.g. name:key=value [available: {}]",
        peripheral,
        backend_names_short(peripheral)
    )
}

#[derive(Parser)]
#[command(name = "flipperpi")]
#[command(author, version, about = "Flipper Zero style multi-tool for the Raspberry Pi", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML)
    /// Defaults to ./flipperpi.toml, then /etc/flipperpi/flipperpi.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub backends: BackendArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Per-peripheral backend overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BackendArgs {
    #[arg(long, global = true, value_name = "SPEC", help = backend_help(Peripheral::Gpio))]
    pub gpio: Option<String>,

    #[arg(long, global = true, value_name = "SPEC", help = backend_help(Peripheral::Display))]
    pub display: Option<String>,

    #[arg(long, global = true, value_name = "SPEC", help = backend_help(Peripheral::Nfc))]
    pub nfc: Option<String>,

    #[arg(long, global = true, value_name = "SPEC", help = backend_help(Peripheral::Wifi))]
    pub wifi: Option<String>,

    #[arg(long, global = true, value_name = "SPEC", help = backend_help(Peripheral::Bluetooth))]
    pub bluetooth: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan WiFi and Bluetooth continuously until interrupted
    Run {
        /// Stop after this many scan cycles
        #[arg(long)]
        cycles: Option<u64>,

        /// Seconds the LED stays on after each scan (overrides config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Scan for WiFi networks once
    Wifi {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Scan for Bluetooth devices once
    Bluetooth {
        /// Inquiry duration in seconds (overrides config)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Browse the service records of each device
        #[arg(short, long)]
        services: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Read an NFC tag
    Nfc {
        /// Keep polling for up to this many seconds until a tag shows up
        #[arg(short, long, default_value = "0")]
        wait: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Emulate an RFID tag
    Emulate {
        /// Tag UID in hex (4, 7 or 10 bytes, e.g. 08:A1:B2:C3)
        tag: String,
    },

    /// Show the state of the push buttons
    Buttons {
        /// Keep printing button changes until interrupted
        #[arg(short, long)]
        watch: bool,
    },

    /// List available backends
    ListBackends,

    /// Print the effective configuration
    ShowConfig,
}
