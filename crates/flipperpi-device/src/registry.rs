//! Backend registry
//!
//! This module opens peripheral backends by name. A backend is selected with
//! a spec string of the form `name` or `name:key=value,key=value`, one per
//! peripheral kind, for example `ssd1306:bus=1,addr=0x3c`.

use flipperpi_core::{BluetoothScanner, Buttons, Display, NfcFrontend, StatusLed, WifiScanner};
use std::collections::HashMap;
use std::fmt;

/// Boxed error used throughout the registry
pub type BoxError = Box<dyn std::error::Error>;

/// Status LED and button bank opened together from one GPIO backend
pub type BoxedGpio = (Box<dyn StatusLed>, Box<dyn Buttons>);

/// Peripheral kinds that can be configured with a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    /// Status LED and push buttons
    Gpio,
    /// OLED display
    Display,
    /// NFC reader and tag emulator
    Nfc,
    /// WiFi scanner
    Wifi,
    /// Bluetooth scanner
    Bluetooth,
}

impl Peripheral {
    /// All peripheral kinds, in configuration order
    pub const ALL: [Peripheral; 5] = [
        Peripheral::Gpio,
        Peripheral::Display,
        Peripheral::Nfc,
        Peripheral::Wifi,
        Peripheral::Bluetooth,
    ];

    /// Name used in configuration files and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            Peripheral::Gpio => "gpio",
            Peripheral::Display => "display",
            Peripheral::Nfc => "nfc",
            Peripheral::Wifi => "wifi",
            Peripheral::Bluetooth => "bluetooth",
        }
    }

    /// Whether the peripheral may be disabled with the `none` backend
    pub fn is_optional(self) -> bool {
        self != Peripheral::Gpio
    }
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed backend parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendParams {
    /// Backend name
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl BackendParams {
    /// Parameters as borrowed pairs, the form the backend crates take
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

impl fmt::Display for BackendParams {
    /// Renders back to spec string form, keys sorted
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let mut keys: Vec<&String> = self.params.keys().collect();
        keys.sort();
        for (i, key) in keys.into_iter().enumerate() {
            let sep = if i == 0 { ':' } else { ',' };
            write!(f, "{}{}={}", sep, key, self.params[key])?;
        }
        Ok(())
    }
}

/// Parse a backend string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
///
/// # Example
/// ```
/// use flipperpi_device::parse_backend_params;
///
/// let params = parse_backend_params("pn532:dev=/dev/ttyS0").unwrap();
/// assert_eq!(params.name, "pn532");
/// assert_eq!(params.params.get("dev"), Some(&"/dev/ttyS0".to_string()));
/// ```
pub fn parse_backend_params(s: &str) -> Result<BackendParams, BoxError> {
    let s = s.trim();
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));
    if name.is_empty() {
        return Err(format!("Missing backend name in '{}'", s).into());
    }

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.trim().to_string(), value.trim().to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(BackendParams {
        name: name.to_string(),
        params,
    })
}

/// Open the status LED and buttons
///
/// There is no `none` backend for GPIO; the LED and buttons are required.
pub fn open_gpio(spec: &str) -> Result<BoxedGpio, BoxError> {
    let params = parse_backend_params(spec)?;

    match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy_gpio(&params),

        #[cfg(feature = "linux-gpio")]
        "linux_gpio" | "linux-gpio" | "gpiochip" => {
            log::info!("Opening Linux GPIO...");
            flipperpi_linux_gpio::open_linux_gpio(&params.options()).map_err(|e| {
                format!(
                    "Failed to open GPIO: {}\n\
                     Make sure you have access to the GPIO chip (gpio group or root).",
                    e
                )
                .into()
            })
        }

        _ => Err(unknown(Peripheral::Gpio, &params.name)),
    }
}

/// Open the display, `Ok(None)` for the `none` backend
pub fn open_display(spec: &str) -> Result<Option<Box<dyn Display>>, BoxError> {
    let params = parse_backend_params(spec)?;

    match params.name.as_str() {
        "none" => Ok(None),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy_display(&params).map(Some),

        #[cfg(feature = "ssd1306")]
        "ssd1306" | "oled" => {
            log::info!("Opening SSD1306 display...");
            flipperpi_ssd1306::open_ssd1306(&params.options())
                .map(Some)
                .map_err(|e| format!("Failed to open SSD1306: {}", e).into())
        }

        _ => Err(unknown(Peripheral::Display, &params.name)),
    }
}

/// Open the NFC front end, `Ok(None)` for the `none` backend
pub fn open_nfc(spec: &str) -> Result<Option<Box<dyn NfcFrontend>>, BoxError> {
    let params = parse_backend_params(spec)?;

    match params.name.as_str() {
        "none" => Ok(None),

        #[cfg(feature = "dummy")]
        "dummy" => open_dummy_nfc(&params).map(Some),

        #[cfg(feature = "pn532")]
        "pn532" => {
            log::info!("Opening PN532...");
            flipperpi_pn532::open_pn532(&params.options())
                .map(Some)
                .map_err(|e| format!("Failed to open PN532: {}", e).into())
        }

        _ => Err(unknown(Peripheral::Nfc, &params.name)),
    }
}

/// Open the WiFi scanner, `Ok(None)` for the `none` backend
pub fn open_wifi(spec: &str) -> Result<Option<Box<dyn WifiScanner>>, BoxError> {
    let params = parse_backend_params(spec)?;

    match params.name.as_str() {
        "none" => Ok(None),

        #[cfg(feature = "dummy")]
        "dummy" => Ok(Some(Box::new(flipperpi_dummy::DummyWifi::sample()))),

        #[cfg(feature = "linux-scan")]
        "iwlist" => flipperpi_linux_scan::open_iwlist(&params.options())
            .map(Some)
            .map_err(|e| format!("Invalid iwlist parameters: {}", e).into()),

        _ => Err(unknown(Peripheral::Wifi, &params.name)),
    }
}

/// Open the Bluetooth scanner, `Ok(None)` for the `none` backend
pub fn open_bluetooth(spec: &str) -> Result<Option<Box<dyn BluetoothScanner>>, BoxError> {
    let params = parse_backend_params(spec)?;

    match params.name.as_str() {
        "none" => Ok(None),

        #[cfg(feature = "dummy")]
        "dummy" => Ok(Some(Box::new(flipperpi_dummy::DummyBluetooth::sample()))),

        #[cfg(feature = "linux-scan")]
        "bluez" | "hcitool" => flipperpi_linux_scan::open_bluez(&params.options())
            .map(Some)
            .map_err(|e| format!("Invalid bluez parameters: {}", e).into()),

        _ => Err(unknown(Peripheral::Bluetooth, &params.name)),
    }
}

fn unknown(peripheral: Peripheral, name: &str) -> BoxError {
    format!(
        "Unknown {} backend: {} (available: {})",
        peripheral,
        name,
        backend_names_short(peripheral)
    )
    .into()
}

#[cfg(feature = "dummy")]
fn parse_u32(key: &str, value: &str) -> Result<u32, BoxError> {
    value
        .parse()
        .map_err(|_| format!("Invalid {} value: {}", key, value).into())
}

#[cfg(feature = "dummy")]
fn open_dummy_gpio(params: &BackendParams) -> Result<BoxedGpio, BoxError> {
    use flipperpi_dummy::{DummyButtons, DummyLed};

    let pins = match params.params.get("buttons") {
        Some(list) => list
            .split(':')
            .map(|p| parse_u32("buttons", p))
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![17, 22, 27],
    };

    log::info!("Using dummy GPIO (buttons {:?})", pins);
    Ok((Box::new(DummyLed::new()), Box::new(DummyButtons::new(&pins))))
}

#[cfg(feature = "dummy")]
fn open_dummy_display(params: &BackendParams) -> Result<Box<dyn Display>, BoxError> {
    let width = match params.params.get("width") {
        Some(v) => parse_u32("width", v)?,
        None => 128,
    };
    let height = match params.params.get("height") {
        Some(v) => parse_u32("height", v)?,
        None => 64,
    };
    if width == 0 || height == 0 {
        return Err("Dummy display size must be non-zero".into());
    }
    Ok(Box::new(flipperpi_dummy::DummyDisplay::new(width, height)))
}

#[cfg(feature = "dummy")]
fn open_dummy_nfc(params: &BackendParams) -> Result<Box<dyn NfcFrontend>, BoxError> {
    use flipperpi_core::{NfcRead, NfcTag, RfidTag};
    use flipperpi_dummy::DummyNfc;

    let nfc = DummyNfc::new();
    if let Some(uid) = params.params.get("tag") {
        let tag = RfidTag::parse(uid)?;
        nfc.push_read(NfcRead::Tag(NfcTag {
            uid: tag.uid().to_vec(),
            sens_res: 0x0044,
            sel_res: 0x00,
        }));
    }
    Ok(Box::new(nfc))
}

// Backend information and listing
/// Information about a backend
pub struct BackendInfo {
    /// Peripheral kind the backend serves
    pub peripheral: Peripheral,
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<BackendInfo> {
    let mut backends = Vec::new();

    #[cfg(feature = "linux-gpio")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Gpio,
        name: "linux_gpio",
        aliases: &["linux-gpio", "gpiochip"],
        description: "GPIO character device (dev=/dev/gpiochipN,led=18,buttons=17:22:27)",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Gpio,
        name: "dummy",
        aliases: &[],
        description: "In-memory LED and buttons (buttons=17:22:27)",
    });

    #[cfg(feature = "ssd1306")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Display,
        name: "ssd1306",
        aliases: &["oled"],
        description: "SSD1306 OLED over i2c-dev (bus=1,addr=0x3c,width=128,height=64)",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Display,
        name: "dummy",
        aliases: &[],
        description: "In-memory framebuffer (width=128,height=64)",
    });

    #[cfg(feature = "pn532")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Nfc,
        name: "pn532",
        aliases: &[],
        description: "PN532 reader/emulator over UART (dev=/dev/ttyS0,baud=115200)",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Nfc,
        name: "dummy",
        aliases: &[],
        description: "Simulated reader, optionally with one tag in the field (tag=<uid>)",
    });

    #[cfg(feature = "linux-scan")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Wifi,
        name: "iwlist",
        aliases: &[],
        description: "Wireless tools scan (iface=wlan0)",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Wifi,
        name: "dummy",
        aliases: &[],
        description: "Two canned networks",
    });

    #[cfg(feature = "linux-scan")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Bluetooth,
        name: "bluez",
        aliases: &["hcitool"],
        description: "BlueZ hcitool inquiry and sdptool browse (adapter=hci0)",
    });

    #[cfg(feature = "dummy")]
    backends.push(BackendInfo {
        peripheral: Peripheral::Bluetooth,
        name: "dummy",
        aliases: &[],
        description: "Two canned devices",
    });

    for peripheral in Peripheral::ALL.into_iter().filter(|p| p.is_optional()) {
        backends.push(BackendInfo {
            peripheral,
            name: "none",
            aliases: &[],
            description: "Disabled",
        });
    }

    backends
}

/// Generate a short list of backend names for one peripheral
pub fn backend_names_short(peripheral: Peripheral) -> String {
    let names: Vec<&str> = available_backends()
        .iter()
        .filter(|b| b.peripheral == peripheral)
        .map(|b| b.name)
        .collect();
    if names.is_empty() {
        return "none (recompile with features)".to_string();
    }
    names.join(", ")
}
