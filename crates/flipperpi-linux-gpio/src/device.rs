//! Linux GPIO LED and button implementation
//!
//! All lines are claimed with a single request on the GPIO chip. The LED and
//! the button bank are handed out as separate objects sharing that request,
//! and the lines are released when the last of them is dropped.
//!
//! Buttons are wired between the GPIO and ground, so they are requested as
//! active-low inputs with the internal pull-up enabled: a pressed button
//! reads as active.

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Bias, Offset, Value};
use gpiocdev::request::{Config, Request};

use flipperpi_core::error::Result as CoreResult;
use flipperpi_core::{ButtonState, Buttons, StatusLed};

use std::sync::Arc;

/// Default GPIO chip on a Raspberry Pi
pub const DEFAULT_CHIP: &str = "/dev/gpiochip0";

/// Default status LED line (BCM numbering)
pub const DEFAULT_LED: Offset = 18;

/// Default button lines (BCM numbering)
pub const DEFAULT_BUTTONS: [Offset; 3] = [17, 22, 27];

/// Consumer label shown by `gpioinfo`
const CONSUMER: &str = "flipperpi";

/// Configuration for claiming the LED and button lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxGpioConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// Status LED line offset
    pub led: Offset,
    /// Button line offsets
    pub buttons: Vec<Offset>,
    /// Drive the LED low to light it
    pub led_active_low: bool,
}

impl Default for LinuxGpioConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_CHIP.to_string(),
            led: DEFAULT_LED,
            buttons: DEFAULT_BUTTONS.to_vec(),
            led_active_low: false,
        }
    }
}

impl LinuxGpioConfig {
    /// Check that no line is claimed twice
    pub fn validate(&self) -> Result<()> {
        let mut seen = vec![self.led];
        for &b in &self.buttons {
            if seen.contains(&b) {
                return Err(LinuxGpioError::DuplicateLine(b));
            }
            seen.push(b);
        }
        Ok(())
    }
}

/// Claim the LED and button lines
///
/// The LED starts off.
pub fn open(config: &LinuxGpioConfig) -> Result<(GpioLed, GpioButtons)> {
    config.validate()?;

    log::debug!("linux_gpio: Opening device {}", config.device);

    let mut req_config = Config::default();

    req_config.with_line(config.led).as_output(Value::Inactive);
    if config.led_active_low {
        req_config.as_active_low();
    }

    for &button in &config.buttons {
        req_config
            .with_line(button)
            .as_input()
            .as_active_low()
            .with_bias(Bias::PullUp);
    }

    let request = Request::from_config(req_config)
        .on_chip(&config.device)
        .with_consumer(CONSUMER)
        .request()
        .map_err(|source| LinuxGpioError::LineRequestFailed {
            path: config.device.clone(),
            source,
        })?;

    log::info!(
        "linux_gpio: Opened {} (led={}, buttons={:?})",
        config.device,
        config.led,
        config.buttons
    );

    let request = Arc::new(request);
    Ok((
        GpioLed {
            request: Arc::clone(&request),
            line: config.led,
            on: false,
        },
        GpioButtons {
            request,
            lines: config.buttons.clone(),
        },
    ))
}

/// Status LED on a GPIO output line
pub struct GpioLed {
    request: Arc<Request>,
    line: Offset,
    on: bool,
}

impl GpioLed {
    fn write(&self, on: bool) -> Result<()> {
        let value = if on { Value::Active } else { Value::Inactive };
        self.request
            .set_value(self.line, value)
            .map(|_| ())
            .map_err(|source| LinuxGpioError::SetValueFailed {
                line: self.line,
                source,
            })
    }
}

impl StatusLed for GpioLed {
    fn set(&mut self, on: bool) -> CoreResult<()> {
        self.write(on)?;
        self.on = on;
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on
    }
}

impl Drop for GpioLed {
    fn drop(&mut self) {
        // Leave the LED dark once the lines are released
        if let Err(e) = self.write(false) {
            log::debug!("linux_gpio: Failed to switch LED off on release: {}", e);
        }
    }
}

/// Push buttons on GPIO input lines
pub struct GpioButtons {
    request: Arc<Request>,
    lines: Vec<Offset>,
}

impl Buttons for GpioButtons {
    fn read(&mut self) -> CoreResult<Vec<ButtonState>> {
        let mut states = Vec::with_capacity(self.lines.len());
        for &line in &self.lines {
            let value = self
                .request
                .value(line)
                .map_err(LinuxGpioError::GetValueFailed)?;
            states.push(ButtonState {
                pin: line,
                pressed: value == Value::Active,
            });
        }
        Ok(states)
    }
}

/// Parse `linux_gpio` backend options
///
/// Supported options:
/// - `dev=/dev/gpiochipN` - GPIO chip device path
/// - `gpiochip=N` - GPIO chip number (alternative to dev)
/// - `led=N` - status LED line (default 18)
/// - `buttons=A:B:C` - button lines, colon separated (default 17:22:27)
/// - `led_active_low=true|false` - invert the LED output
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioConfig> {
    let mut config = LinuxGpioConfig::default();
    let mut dev: Option<String> = None;
    let mut gpiochip: Option<u32> = None;

    for &(key, value) in options {
        match key {
            "dev" => {
                dev = Some(value.to_string());
            }
            "gpiochip" => {
                let n: u32 = value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("Invalid gpiochip value: {}", value))
                })?;
                if n > 9 {
                    return Err(LinuxGpioError::InvalidParameter(
                        "Maximum gpiochip number supported is 9".to_string(),
                    ));
                }
                gpiochip = Some(n);
            }
            "led" => {
                config.led = parse_line("led", value)?;
            }
            "buttons" => {
                config.buttons = if value.is_empty() {
                    Vec::new()
                } else {
                    value
                        .split(':')
                        .map(|v| parse_line("buttons", v))
                        .collect::<Result<Vec<_>>>()?
                };
            }
            "led_active_low" => {
                config.led_active_low = value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!(
                        "Invalid led_active_low value: {}",
                        value
                    ))
                })?;
            }
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
            }
        }
    }

    match (dev, gpiochip) {
        (Some(_), Some(_)) => return Err(LinuxGpioError::ConflictingDevice),
        (Some(path), None) => config.device = path,
        (None, Some(n)) => config.device = format!("/dev/gpiochip{}", n),
        (None, None) => {}
    }

    config.validate()?;
    Ok(config)
}

fn parse_line(name: &str, value: &str) -> Result<Offset> {
    value.trim().parse().map_err(|_| {
        LinuxGpioError::InvalidParameter(format!("Invalid {} line: {}", name, value))
    })
}
