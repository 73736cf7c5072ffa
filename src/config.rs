//! Configuration file handling
//!
//! The configuration is a TOML file:
//!
//! ```toml
//! [device]
//! gpio = "linux_gpio:led=18,buttons=17:22:27"
//! display = "ssd1306:bus=1,addr=0x3c"
//! nfc = "pn532:dev=/dev/ttyS0"
//! wifi = "iwlist"
//! bluetooth = "bluez"
//!
//! [scan]
//! interval_secs = 10
//! led_off_secs = 2
//! error_backoff_secs = 5
//! bluetooth_duration_secs = 8
//! wifi_interface = "wlan0"
//! ```
//!
//! Every key is optional. Command line overrides are applied on top.

use crate::cli::BackendArgs;
use flipperpi_device::{parse_backend_params, BackendSpecs, ScanTiming};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Locations searched when no configuration file is given
pub const DEFAULT_PATHS: [&str; 2] = ["flipperpi.toml", "/etc/flipperpi/flipperpi.toml"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Backend selection, one spec string per peripheral
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceSection {
    pub gpio: String,
    pub display: String,
    pub nfc: String,
    pub wifi: String,
    pub bluetooth: String,
}

impl Default for DeviceSection {
    fn default() -> Self {
        let specs = BackendSpecs::default();
        Self {
            gpio: specs.gpio,
            display: specs.display,
            nfc: specs.nfc,
            wifi: specs.wifi,
            bluetooth: specs.bluetooth,
        }
    }
}

/// Scan loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanSection {
    pub interval_secs: u64,
    pub led_off_secs: u64,
    pub error_backoff_secs: u64,
    pub bluetooth_duration_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_interface: Option<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            led_off_secs: 2,
            error_backoff_secs: 5,
            bluetooth_duration_secs: 8,
            wifi_interface: None,
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub device: DeviceSection,
    pub scan: ScanSection,
}

impl Config {
    /// Parse configuration text
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Load the configuration
    ///
    /// An explicit path must exist. Otherwise the default locations are
    /// tried in order, and built-in defaults are used when none exists.
    /// Returns the configuration and the file it came from.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }
        Self::search(DEFAULT_PATHS.iter().map(PathBuf::from))
    }

    fn search(
        candidates: impl IntoIterator<Item = PathBuf>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in candidates {
            if path.is_file() {
                log::debug!("Loading configuration from {}", path.display());
                return Ok((Self::from_file(&path)?, Some(path)));
            }
        }
        log::debug!("No configuration file found, using defaults");
        Ok((Self::default(), None))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.bluetooth_duration_secs == 0 {
            return Err(ConfigError::Invalid(
                "bluetooth_duration_secs must be at least 1".to_string(),
            ));
        }
        for (name, spec) in [
            ("gpio", &self.device.gpio),
            ("display", &self.device.display),
            ("nfc", &self.device.nfc),
            ("wifi", &self.device.wifi),
            ("bluetooth", &self.device.bluetooth),
        ] {
            parse_backend_params(spec)
                .map_err(|e| ConfigError::Invalid(format!("device.{}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Replace backend specs with those given on the command line
    pub fn apply_overrides(&mut self, args: &BackendArgs) {
        let overrides = [
            (&mut self.device.gpio, &args.gpio),
            (&mut self.device.display, &args.display),
            (&mut self.device.nfc, &args.nfc),
            (&mut self.device.wifi, &args.wifi),
            (&mut self.device.bluetooth, &args.bluetooth),
        ];
        for (spec, arg) in overrides {
            if let Some(value) = arg {
                *spec = value.clone();
            }
        }
    }

    /// Backend specs to open the device with
    ///
    /// `scan.wifi_interface` is passed to the iwlist backend unless its spec
    /// already names an interface.
    pub fn backend_specs(&self) -> BackendSpecs {
        let mut wifi = self.device.wifi.clone();
        if let (Some(iface), Ok(mut params)) = (
            &self.scan.wifi_interface,
            parse_backend_params(&self.device.wifi),
        ) {
            let named = params.params.contains_key("iface")
                || params.params.contains_key("interface");
            if params.name == "iwlist" && !named {
                params.params.insert("iface".to_string(), iface.clone());
                wifi = params.to_string();
            }
        }

        BackendSpecs {
            gpio: self.device.gpio.clone(),
            display: self.device.display.clone(),
            nfc: self.device.nfc.clone(),
            wifi,
            bluetooth: self.device.bluetooth.clone(),
        }
    }

    /// Scan cycle timing
    pub fn timing(&self) -> ScanTiming {
        ScanTiming {
            interval: Duration::from_secs(self.scan.interval_secs),
            led_off: Duration::from_secs(self.scan.led_off_secs),
            error_backoff: Duration::from_secs(self.scan.error_backoff_secs),
        }
    }

    /// Bluetooth inquiry duration
    pub fn bluetooth_duration(&self) -> Duration {
        Duration::from_secs(self.scan.bluetooth_duration_secs)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.device.gpio, "linux_gpio");
        assert_eq!(config.device.nfc, "none");
        assert_eq!(config.timing(), ScanTiming::default());
        assert_eq!(config.bluetooth_duration(), Duration::from_secs(8));
    }

    #[test]
    fn test_parse_partial_file() {
        let text = r#"
[device]
nfc = "pn532:dev=/dev/ttyS0"

[scan]
interval_secs = 30
"#;
        let config = Config::parse(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.device.nfc, "pn532:dev=/dev/ttyS0");
        assert_eq!(config.device.display, "ssd1306");
        assert_eq!(config.scan.interval_secs, 30);
        assert_eq!(config.scan.led_off_secs, 2);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = Config::parse("[scan]\nintervl_secs = 3\n", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(matches!(
            Config::parse("[scan]\nbluetooth_duration_secs = 0\n", Path::new("x.toml")),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::parse("[device]\ndisplay = \"ssd1306:bus\"\n", Path::new("x.toml")),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[device]\nwifi = \"dummy\"").unwrap();

        let (config, path) = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.device.wifi, "dummy");
        assert_eq!(path.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_search_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.toml");
        let second = dir.path().join("second.toml");
        fs::write(&second, "[scan]\nled_off_secs = 7\n").unwrap();

        let (config, path) = Config::search([first.clone(), second.clone()]).unwrap();
        assert_eq!(config.scan.led_off_secs, 7);
        assert_eq!(path, Some(second.clone()));

        fs::write(&first, "[scan]\nled_off_secs = 1\n").unwrap();
        let (config, path) = Config::search([first.clone(), second]).unwrap();
        assert_eq!(config.scan.led_off_secs, 1);
        assert_eq!(path, Some(first));

        let (config, path) = Config::search([dir.path().join("none.toml")]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(path, None);
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(&BackendArgs {
            gpio: Some("dummy".to_string()),
            nfc: Some("dummy:tag=DEADBEEF".to_string()),
            ..BackendArgs::default()
        });
        assert_eq!(config.device.gpio, "dummy");
        assert_eq!(config.device.nfc, "dummy:tag=DEADBEEF");
        assert_eq!(config.device.display, "ssd1306");
    }

    #[test]
    fn test_wifi_interface() {
        let mut config = Config::default();
        config.scan.wifi_interface = Some("wlan1".to_string());
        assert_eq!(config.backend_specs().wifi, "iwlist:iface=wlan1");

        config.device.wifi = "iwlist:iface=wlan2".to_string();
        assert_eq!(config.backend_specs().wifi, "iwlist:iface=wlan2");

        config.device.wifi = "dummy".to_string();
        assert_eq!(config.backend_specs().wifi, "dummy");
    }

    #[test]
    fn test_wifi_interface_with_empty_options() {
        let text = "[device]\nwifi = \"iwlist:\"\n";
        let mut config = Config::parse(text, Path::new("x.toml")).unwrap();
        config.scan.wifi_interface = Some("wlan1".to_string());

        let wifi = config.backend_specs().wifi;
        assert_eq!(wifi, "iwlist:iface=wlan1");
        let params = parse_backend_params(&wifi).unwrap();
        assert_eq!(params.params.get("iface"), Some(&"wlan1".to_string()));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.scan.wifi_interface = Some("wlan0".to_string());
        let text = config.to_toml().unwrap();
        assert!(text.contains("[device]"));
        assert_eq!(Config::parse(&text, Path::new("x.toml")).unwrap(), config);
    }
}
