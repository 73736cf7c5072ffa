//! flipperpi-linux-gpio - Status LED and push buttons on Linux GPIO
//!
//! This crate drives the status LED and reads the push buttons through the
//! Linux character device GPIO interface, using the gpiocdev crate. This is
//! the modern replacement for the deprecated sysfs interface and needs no
//! C library.
//!
//! # Example
//!
//! ```no_run
//! use flipperpi_linux_gpio::LinuxGpioConfig;
//! use flipperpi_core::{Buttons, StatusLed};
//!
//! let (mut led, mut buttons) = flipperpi_linux_gpio::open(&LinuxGpioConfig::default())?;
//! led.set(true)?;
//! for b in buttons.read()? {
//!     println!("GPIO{}: {}", b.pin, if b.pressed { "pressed" } else { "released" });
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | Part     | BCM GPIO | Notes |
//! |----------|----------|-------|
//! | Button 1 | 17       | to GND, internal pull-up |
//! | Button 2 | 22       | to GND, internal pull-up |
//! | Button 3 | 27       | to GND, internal pull-up |
//! | LED      | 18       | through a resistor to GND |
//!
//! # System Requirements
//!
//! - Linux kernel 5.5+ for pull-up bias support (v2 API)
//! - Access to `/dev/gpiochipN` (root, or membership of the `gpio` group)

pub mod device;
pub mod error;

// Re-exports
pub use device::{open, parse_options, GpioButtons, GpioLed, LinuxGpioConfig};
pub use error::{LinuxGpioError, Result};

/// Open the LED and buttons from backend options and return them boxed
///
/// This is a convenience function for use in the device registry.
pub fn open_linux_gpio(
    options: &[(&str, &str)],
) -> std::result::Result<
    (
        Box<dyn flipperpi_core::StatusLed>,
        Box<dyn flipperpi_core::Buttons>,
    ),
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let (led, buttons) = open(&config)?;
    Ok((Box::new(led), Box::new(buttons)))
}
