//! Data types exchanged between the backends and the device layer

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A WiFi network seen during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WifiNetwork {
    /// Network name (empty for hidden networks)
    pub ssid: String,
    /// Access point MAC address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    /// Radio channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
    /// Link quality as (value, maximum)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<(u8, u8)>,
    /// Signal level in dBm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_dbm: Option<i32>,
    /// Whether the network requires a key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
}

impl WifiNetwork {
    /// Create a network that only carries a name
    pub fn named(ssid: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            ..Default::default()
        }
    }
}

/// A service record advertised by a Bluetooth device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BluetoothService {
    /// Service name, if advertised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Topmost protocol in the descriptor list (e.g. "RFCOMM")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// RFCOMM channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

/// A Bluetooth device found during discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BluetoothDevice {
    /// Device address (`AA:BB:CC:DD:EE:FF`)
    pub address: String,
    /// Friendly name, if the lookup succeeded
    pub name: Option<String>,
    /// Service records (filled in by the detailed scan)
    pub services: Vec<BluetoothService>,
}

impl BluetoothDevice {
    /// Create a device without services
    pub fn new(address: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            address: address.into(),
            name: name.map(str::to_string),
            services: Vec::new(),
        }
    }
}

/// An ISO14443A tag seen by the NFC reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NfcTag {
    /// NFCID1 (4, 7 or 10 bytes)
    pub uid: Vec<u8>,
    /// ATQA / SENS_RES
    pub sens_res: u16,
    /// SAK / SEL_RES
    pub sel_res: u8,
}

impl NfcTag {
    /// UID as colon separated upper case hex
    pub fn uid_hex(&self) -> String {
        hex_colon(&self.uid)
    }
}

/// Result of a single NFC read attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum NfcRead {
    /// A tag answered
    Tag(NfcTag),
    /// Nothing in the field
    NoTag,
}

impl fmt::Display for NfcRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tag(tag) => write!(
                f,
                "UID {} (ATQA 0x{:04X}, SAK 0x{:02X})",
                tag.uid_hex(),
                tag.sens_res,
                tag.sel_res
            ),
            Self::NoTag => write!(f, "No tag detected"),
        }
    }
}

/// Tag identity to present during RFID emulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RfidTag {
    raw: String,
    uid: Vec<u8>,
}

/// Valid NFCID1 lengths (single, double and triple size)
const UID_LENGTHS: [usize; 3] = [4, 7, 10];

impl RfidTag {
    /// Parse tag data given as hex, with optional `0x` prefix and `:`, `-`
    /// or space separators
    pub fn parse(data: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidTagData {
            data: data.to_string(),
            reason,
        };

        let trimmed = data.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let digits: String = body
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | ' '))
            .collect();

        if digits.is_empty() {
            return Err(invalid("empty"));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid("not hexadecimal"));
        }
        if digits.len() % 2 != 0 {
            return Err(invalid("odd number of hex digits"));
        }

        let uid = (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| invalid("not hexadecimal"))?;

        if !UID_LENGTHS.contains(&uid.len()) {
            return Err(invalid("UID must be 4, 7 or 10 bytes"));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            uid,
        })
    }

    /// The text the tag was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// UID bytes
    pub fn uid(&self) -> &[u8] {
        &self.uid
    }

    /// UID as colon separated upper case hex
    pub fn uid_hex(&self) -> String {
        hex_colon(&self.uid)
    }
}

/// Outcome of an emulation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmulationOutcome {
    /// A reader selected the emulated tag
    Activated,
    /// No reader came by before the timeout
    NoReader,
}

/// State of a single push button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonState {
    /// BCM GPIO number
    pub pin: u32,
    /// True while the button is held down
    pub pressed: bool,
}

/// Combined result of one WiFi + Bluetooth scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// WiFi networks
    pub wifi: Vec<WifiNetwork>,
    /// Bluetooth devices, with services
    pub bluetooth: Vec<BluetoothDevice>,
}

fn hex_colon(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfid_tag_parse_formats() {
        let tag = RfidTag::parse("04:A2:3B:1C").unwrap();
        assert_eq!(tag.uid(), &[0x04, 0xA2, 0x3B, 0x1C]);
        assert_eq!(tag.raw(), "04:A2:3B:1C");

        let tag = RfidTag::parse("0x04a23b1c5d6e7f").unwrap();
        assert_eq!(tag.uid().len(), 7);
        assert_eq!(tag.uid_hex(), "04:A2:3B:1C:5D:6E:7F");

        let tag = RfidTag::parse(" de ad be ef ").unwrap();
        assert_eq!(tag.uid(), &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_rfid_tag_parse_rejects() {
        assert!(matches!(
            RfidTag::parse(""),
            Err(Error::InvalidTagData { reason: "empty", .. })
        ));
        assert!(matches!(
            RfidTag::parse("hello"),
            Err(Error::InvalidTagData {
                reason: "not hexadecimal",
                ..
            })
        ));
        assert!(matches!(
            RfidTag::parse("ABC"),
            Err(Error::InvalidTagData {
                reason: "odd number of hex digits",
                ..
            })
        ));
        // 5 bytes is not a valid NFCID1 size
        assert!(RfidTag::parse("0102030405").is_err());
    }

    #[test]
    fn test_nfc_read_display() {
        let read = NfcRead::Tag(NfcTag {
            uid: vec![0x04, 0x11, 0x22, 0x33],
            sens_res: 0x0044,
            sel_res: 0x00,
        });
        assert_eq!(
            read.to_string(),
            "UID 04:11:22:33 (ATQA 0x0044, SAK 0x00)"
        );
        assert_eq!(NfcRead::NoTag.to_string(), "No tag detected");
    }
}
