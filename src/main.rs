//! flipperpi - A Flipper Zero style multi-tool for the Raspberry Pi
//!
//! Drives a Pi fitted with push buttons, a status LED, an SSD1306 OLED and a
//! PN532 NFC board, and uses the Pi's own WiFi and Bluetooth radios.
//!
//! # Architecture
//!
//! Every peripheral is opened by a backend spec string (for example
//! `ssd1306:bus=1,addr=0x3c`) through `flipperpi-device`, which hands back a
//! `DeviceHandle`. The commands only talk to that handle, so any peripheral
//! can be swapped for its `dummy` backend to run without hardware.

mod cli;
mod commands;
mod config;
mod signal;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, RUST_LOG takes precedence over -v
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = signal::install() {
        log::warn!("Failed to install signal handlers: {}", e);
    }

    let (mut config, source) = match Config::load(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    config.apply_overrides(&cli.backends);

    match cli.command {
        Commands::Run { cycles, interval } => commands::cmd_run(&config, cycles, interval),
        Commands::Wifi { json } => commands::cmd_wifi(&config, json),
        Commands::Bluetooth {
            duration,
            services,
            json,
        } => commands::cmd_bluetooth(&config, duration, services, json),
        Commands::Nfc { wait, json } => commands::cmd_nfc(&config, wait, json),
        Commands::Emulate { tag } => commands::cmd_emulate(&config, &tag),
        Commands::Buttons { watch } => commands::cmd_buttons(&config, watch),
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
        Commands::ShowConfig => commands::show_config(&config, source.as_deref()),
    }
}
