//! SSD1306 panel driver
//!
//! Drawing happens in a [`FrameBuffer`] whose memory layout matches the
//! controller's, so a flush is a window reset followed by the raw buffer.

use crate::bus::{I2cBus, LinuxI2c};
use crate::error::{Result, Ssd1306Error};

use flipperpi_core::error::Result as CoreResult;
use flipperpi_core::{Display, FrameBuffer};

/// Control byte announcing a command stream
const CONTROL_COMMAND: u8 = 0x00;
/// Control byte announcing display RAM data
const CONTROL_DATA: u8 = 0x40;
/// Data bytes sent per I2C message
const DATA_CHUNK: usize = 16;

/// Default 7-bit I2C address (SA0 low)
pub const DEFAULT_ADDRESS: u16 = 0x3C;

/// SSD1306 command opcodes
pub mod cmd {
    /// Display off (sleep)
    pub const DISPLAY_OFF: u8 = 0xAE;
    /// Display on
    pub const DISPLAY_ON: u8 = 0xAF;
    /// Clock divide ratio / oscillator frequency
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    /// Multiplex ratio
    pub const SET_MULTIPLEX: u8 = 0xA8;
    /// Vertical display offset
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    /// Display start line 0
    pub const SET_START_LINE: u8 = 0x40;
    /// Charge pump setting
    pub const CHARGE_PUMP: u8 = 0x8D;
    /// Memory addressing mode
    pub const MEMORY_MODE: u8 = 0x20;
    /// Column 127 mapped to SEG0
    pub const SEG_REMAP: u8 = 0xA1;
    /// Scan from COM[N-1] to COM0
    pub const COM_SCAN_DEC: u8 = 0xC8;
    /// COM pins hardware configuration
    pub const SET_COM_PINS: u8 = 0xDA;
    /// Contrast control
    pub const SET_CONTRAST: u8 = 0x81;
    /// Pre-charge period
    pub const SET_PRECHARGE: u8 = 0xD9;
    /// VCOMH deselect level
    pub const SET_VCOM_DETECT: u8 = 0xDB;
    /// Output follows RAM content
    pub const DISPLAY_ALL_ON_RESUME: u8 = 0xA4;
    /// Non-inverted display
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    /// Stop any running scroll
    pub const DEACTIVATE_SCROLL: u8 = 0x2E;
    /// Column address window
    pub const COLUMN_ADDR: u8 = 0x21;
    /// Page address window
    pub const PAGE_ADDR: u8 = 0x22;
}

/// Configuration for opening an SSD1306 panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ssd1306Config {
    /// I2C adapter (e.g., "/dev/i2c-1")
    pub device: String,
    /// 7-bit slave address
    pub address: u16,
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels (32 or 64)
    pub height: u32,
}

impl Default for Ssd1306Config {
    fn default() -> Self {
        Self {
            device: "/dev/i2c-1".to_string(),
            address: DEFAULT_ADDRESS,
            width: 128,
            height: 64,
        }
    }
}

/// SSD1306 OLED
pub struct Ssd1306<B: I2cBus> {
    bus: B,
    fb: FrameBuffer,
}

impl Ssd1306<LinuxI2c> {
    /// Open the panel described by `config` and initialise it
    pub fn open(config: &Ssd1306Config) -> Result<Self> {
        let bus = LinuxI2c::open(&config.device, config.address)?;
        let panel = Self::new(bus, config.width, config.height)?;
        log::info!(
            "ssd1306: Opened {}x{} panel on {} at 0x{:02X}",
            config.width,
            config.height,
            config.device,
            config.address
        );
        Ok(panel)
    }
}

impl<B: I2cBus> Ssd1306<B> {
    /// Initialise a panel on an already opened bus and blank it
    pub fn new(bus: B, width: u32, height: u32) -> Result<Self> {
        if width == 0 || width > 128 || !matches!(height, 32 | 64) {
            return Err(Ssd1306Error::InvalidParameter(format!(
                "unsupported panel size {}x{}",
                width, height
            )));
        }

        let mut panel = Self {
            bus,
            fb: FrameBuffer::new(width, height),
        };
        panel.init()?;
        panel.show()?;
        Ok(panel)
    }

    /// The bus the panel is attached to
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// The framebuffer that the next flush will send
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.fb
    }

    fn init(&mut self) -> Result<()> {
        let height = self.fb.height();
        let com_pins = if height == 64 { 0x12 } else { 0x02 };

        self.commands(&[cmd::DISPLAY_OFF])?;
        self.commands(&[cmd::SET_CLOCK_DIV, 0x80])?;
        self.commands(&[cmd::SET_MULTIPLEX, (height - 1) as u8])?;
        self.commands(&[cmd::SET_DISPLAY_OFFSET, 0x00])?;
        self.commands(&[cmd::SET_START_LINE])?;
        // Internal DC/DC
        self.commands(&[cmd::CHARGE_PUMP, 0x14])?;
        // Horizontal addressing: RAM pointer wraps column then page
        self.commands(&[cmd::MEMORY_MODE, 0x00])?;
        self.commands(&[cmd::SEG_REMAP])?;
        self.commands(&[cmd::COM_SCAN_DEC])?;
        self.commands(&[cmd::SET_COM_PINS, com_pins])?;
        self.commands(&[cmd::SET_CONTRAST, 0xCF])?;
        self.commands(&[cmd::SET_PRECHARGE, 0xF1])?;
        self.commands(&[cmd::SET_VCOM_DETECT, 0x40])?;
        self.commands(&[cmd::DISPLAY_ALL_ON_RESUME])?;
        self.commands(&[cmd::NORMAL_DISPLAY])?;
        self.commands(&[cmd::DEACTIVATE_SCROLL])?;
        self.commands(&[cmd::DISPLAY_ON])?;
        Ok(())
    }

    /// Send the framebuffer to the panel
    pub fn show(&mut self) -> Result<()> {
        let last_col = (self.fb.width() - 1) as u8;
        let last_page = (self.fb.pages() - 1) as u8;
        self.commands(&[cmd::COLUMN_ADDR, 0, last_col])?;
        self.commands(&[cmd::PAGE_ADDR, 0, last_page])?;

        let mut msg = [0u8; DATA_CHUNK + 1];
        msg[0] = CONTROL_DATA;
        for chunk in self.fb.as_bytes().chunks(DATA_CHUNK) {
            msg[1..=chunk.len()].copy_from_slice(chunk);
            self.bus.write(&msg[..=chunk.len()])?;
        }
        Ok(())
    }

    fn commands(&mut self, bytes: &[u8]) -> Result<()> {
        let mut msg = Vec::with_capacity(bytes.len() + 1);
        msg.push(CONTROL_COMMAND);
        msg.extend_from_slice(bytes);
        self.bus.write(&msg)
    }
}

impl<B: I2cBus> Display for Ssd1306<B> {
    fn width(&self) -> u32 {
        self.fb.width()
    }

    fn height(&self) -> u32 {
        self.fb.height()
    }

    fn clear(&mut self) {
        self.fb.fill(false);
    }

    fn text(&mut self, text: &str, x: i32, y: i32, on: bool) {
        self.fb.text(text, x, y, on);
    }

    fn flush(&mut self) -> CoreResult<()> {
        self.show()?;
        Ok(())
    }
}

impl<B: I2cBus> Drop for Ssd1306<B> {
    fn drop(&mut self) {
        self.fb.fill(false);
        let blank = self.show();
        let off = self.commands(&[cmd::DISPLAY_OFF]);
        if let Err(e) = blank.and(off) {
            log::debug!("ssd1306: Failed to power down panel: {}", e);
        }
    }
}

/// Parse `ssd1306` backend options
///
/// Supported options:
/// - `bus=N` - I2C adapter number, opens `/dev/i2c-N` (default 1)
/// - `dev=/dev/i2c-N` - I2C adapter path (alternative to bus)
/// - `addr=0x3c` - 7-bit slave address, hex or decimal
/// - `width=128`, `height=64` - panel geometry
pub fn parse_options(options: &[(&str, &str)]) -> Result<Ssd1306Config> {
    let mut config = Ssd1306Config::default();
    let mut have_bus = false;
    let mut have_dev = false;

    for &(key, value) in options {
        match key {
            "bus" => {
                let n: u32 = parse_number("bus", value)?;
                config.device = format!("/dev/i2c-{}", n);
                have_bus = true;
            }
            "dev" => {
                config.device = value.to_string();
                have_dev = true;
            }
            "addr" => {
                let addr = parse_number("addr", value)?;
                if addr > 0x7F {
                    return Err(Ssd1306Error::InvalidParameter(format!(
                        "addr must be a 7-bit address, got 0x{:X}",
                        addr
                    )));
                }
                config.address = addr as u16;
            }
            "width" => config.width = parse_number("width", value)?,
            "height" => config.height = parse_number("height", value)?,
            _ => {
                log::warn!("ssd1306: Unknown option: {}={}", key, value);
            }
        }
    }

    if have_bus && have_dev {
        return Err(Ssd1306Error::InvalidParameter(
            "Only one of 'bus' or 'dev' can be specified".to_string(),
        ));
    }

    Ok(config)
}

fn parse_number(name: &str, value: &str) -> Result<u32> {
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        value.parse()
    };
    parsed.map_err(|_| Ssd1306Error::InvalidParameter(format!("Invalid {} value: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Bus that records every message
    #[derive(Clone, Default)]
    struct RecordingBus {
        messages: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl RecordingBus {
        fn take(&self) -> Vec<Vec<u8>> {
            std::mem::take(&mut *self.messages.lock().unwrap())
        }
    }

    impl I2cBus for RecordingBus {
        fn write(&mut self, bytes: &[u8]) -> Result<()> {
            self.messages.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
    }

    fn data_bytes(messages: &[Vec<u8>]) -> Vec<u8> {
        messages
            .iter()
            .filter(|m| m[0] == CONTROL_DATA)
            .flat_map(|m| m[1..].to_vec())
            .collect()
    }

    #[test]
    fn test_init_sequence() {
        let bus = RecordingBus::default();
        let _panel = Ssd1306::new(bus.clone(), 128, 64).unwrap();
        let messages = bus.take();

        assert_eq!(messages[0], vec![CONTROL_COMMAND, cmd::DISPLAY_OFF]);
        assert!(messages.contains(&vec![CONTROL_COMMAND, cmd::SET_MULTIPLEX, 63]));
        assert!(messages.contains(&vec![CONTROL_COMMAND, cmd::SET_COM_PINS, 0x12]));
        assert!(messages.contains(&vec![CONTROL_COMMAND, cmd::CHARGE_PUMP, 0x14]));

        // Initial blank frame covers the whole RAM
        let data = data_bytes(&messages);
        assert_eq!(data.len(), 1024);
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_32_row_panel() {
        let bus = RecordingBus::default();
        let _panel = Ssd1306::new(bus.clone(), 128, 32).unwrap();
        let messages = bus.take();
        assert!(messages.contains(&vec![CONTROL_COMMAND, cmd::SET_MULTIPLEX, 31]));
        assert!(messages.contains(&vec![CONTROL_COMMAND, cmd::SET_COM_PINS, 0x02]));
        assert!(messages.contains(&vec![CONTROL_COMMAND, cmd::PAGE_ADDR, 0, 3]));
    }

    #[test]
    fn test_flush_sends_framebuffer() {
        let bus = RecordingBus::default();
        let mut panel = Ssd1306::new(bus.clone(), 128, 64).unwrap();
        bus.take();

        panel.clear();
        panel.text("WiFi: 3", 0, 0, true);
        panel.flush().unwrap();

        let messages = bus.take();
        assert_eq!(messages[0], vec![CONTROL_COMMAND, cmd::COLUMN_ADDR, 0, 127]);
        assert_eq!(messages[1], vec![CONTROL_COMMAND, cmd::PAGE_ADDR, 0, 7]);
        assert!(messages[2..].iter().all(|m| m.len() <= DATA_CHUNK + 1));
        assert_eq!(data_bytes(&messages), panel.framebuffer().as_bytes());
    }

    #[test]
    fn test_drop_powers_off() {
        let bus = RecordingBus::default();
        let panel = Ssd1306::new(bus.clone(), 128, 64).unwrap();
        bus.take();
        drop(panel);
        let messages = bus.take();
        assert_eq!(
            messages.last().unwrap(),
            &vec![CONTROL_COMMAND, cmd::DISPLAY_OFF]
        );
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(Ssd1306::new(RecordingBus::default(), 128, 48).is_err());
        assert!(Ssd1306::new(RecordingBus::default(), 0, 64).is_err());
    }

    #[test]
    fn test_parse_options() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config, Ssd1306Config::default());

        let config = parse_options(&[("bus", "0"), ("addr", "0x3d"), ("height", "32")]).unwrap();
        assert_eq!(config.device, "/dev/i2c-0");
        assert_eq!(config.address, 0x3D);
        assert_eq!(config.height, 32);

        assert!(parse_options(&[("addr", "0x80")]).is_err());
        assert!(parse_options(&[("bus", "1"), ("dev", "/dev/i2c-1")]).is_err());
        assert!(parse_options(&[("width", "wide")]).is_err());
    }
}
