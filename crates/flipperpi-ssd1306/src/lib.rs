//! flipperpi-ssd1306 - SSD1306 OLED over Linux i2c-dev
//!
//! This crate drives the common 128x64 (and 128x32) SSD1306 OLED modules
//! through the kernel's i2c-dev interface. Text is rendered with the font
//! from `flipperpi-core` into a framebuffer that is pushed to the panel on
//! every flush.
//!
//! # Example
//!
//! ```no_run
//! use flipperpi_core::Display;
//! use flipperpi_ssd1306::{Ssd1306, Ssd1306Config};
//!
//! let mut oled = Ssd1306::open(&Ssd1306Config::default())?;
//! oled.clear();
//! oled.text("WiFi: 3", 0, 0, true);
//! oled.text("BT: 1", 0, 10, true);
//! oled.flush()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # System Requirements
//!
//! - I2C enabled (`dtparam=i2c_arm=on` on a Raspberry Pi)
//! - The `i2c-dev` module loaded and access to `/dev/i2c-N`

pub mod bus;
pub mod device;
pub mod error;

// Re-exports
pub use bus::{I2cBus, LinuxI2c};
pub use device::{parse_options, Ssd1306, Ssd1306Config, DEFAULT_ADDRESS};
pub use error::{Result, Ssd1306Error};

/// Open an SSD1306 panel from backend options and return it boxed
///
/// This is a convenience function for use in the device registry.
pub fn open_ssd1306(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn flipperpi_core::Display>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let panel = Ssd1306::open(&config)?;
    Ok(Box::new(panel))
}
