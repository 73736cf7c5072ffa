//! List and show commands implementation

use crate::config::Config;
use flipperpi_device::{available_backends, Peripheral};
use std::path::Path;

/// List all backends compiled into this binary
pub fn list_backends() {
    let backends = available_backends();

    println!("Available backends:");
    for peripheral in Peripheral::ALL {
        println!();
        println!("{}:", peripheral);
        for backend in backends.iter().filter(|b| b.peripheral == peripheral) {
            let aliases = if backend.aliases.is_empty() {
                String::new()
            } else {
                format!(" (aliases: {})", backend.aliases.join(", "))
            };
            println!(
                "  {:<12} - {}{}",
                backend.name, backend.description, aliases
            );
        }
    }
}

/// Print the effective configuration as TOML
pub fn show_config(config: &Config, source: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match source {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# Built-in defaults"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
