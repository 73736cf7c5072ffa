//! DeviceHandle - the assembled multi-tool
//!
//! The handle owns one boxed backend per peripheral and implements the
//! device level operations on top of them. Only the LED and buttons are
//! mandatory; every other peripheral may be absent, in which case the
//! operations that need it degrade the way a missing module should (empty
//! scan results, no display updates).

use crate::registry::{
    open_bluetooth, open_display, open_gpio, open_nfc, open_wifi, BoxError, Peripheral,
};
use flipperpi_core::error::{Error, Result};
use flipperpi_core::{
    BluetoothDevice, BluetoothScanner, ButtonState, Buttons, Display, EmulationOutcome,
    NfcFrontend, NfcRead, RfidTag, ScanReport, StatusLed, WifiNetwork, WifiScanner,
};
use std::time::Duration;

/// Default Bluetooth inquiry duration
pub const DEFAULT_BLUETOOTH_DURATION: Duration = Duration::from_secs(8);

/// Backend spec strings, one per peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSpecs {
    /// Status LED and buttons
    pub gpio: String,
    /// OLED display
    pub display: String,
    /// NFC reader and emulator
    pub nfc: String,
    /// WiFi scanner
    pub wifi: String,
    /// Bluetooth scanner
    pub bluetooth: String,
}

impl Default for BackendSpecs {
    fn default() -> Self {
        Self {
            gpio: "linux_gpio".to_string(),
            display: "ssd1306".to_string(),
            nfc: "none".to_string(),
            wifi: "iwlist".to_string(),
            bluetooth: "bluez".to_string(),
        }
    }
}

impl BackendSpecs {
    /// Every peripheral on its dummy backend
    pub fn dummy() -> Self {
        Self {
            gpio: "dummy".to_string(),
            display: "dummy".to_string(),
            nfc: "dummy".to_string(),
            wifi: "dummy".to_string(),
            bluetooth: "dummy".to_string(),
        }
    }

    /// Spec string for one peripheral
    pub fn get(&self, peripheral: Peripheral) -> &str {
        match peripheral {
            Peripheral::Gpio => &self.gpio,
            Peripheral::Display => &self.display,
            Peripheral::Nfc => &self.nfc,
            Peripheral::Wifi => &self.wifi,
            Peripheral::Bluetooth => &self.bluetooth,
        }
    }

    /// Replace the spec string for one peripheral
    pub fn set(&mut self, peripheral: Peripheral, spec: impl Into<String>) {
        let slot = match peripheral {
            Peripheral::Gpio => &mut self.gpio,
            Peripheral::Display => &mut self.display,
            Peripheral::Nfc => &mut self.nfc,
            Peripheral::Wifi => &mut self.wifi,
            Peripheral::Bluetooth => &mut self.bluetooth,
        };
        *slot = spec.into();
    }
}

/// The assembled device
///
/// Dropping the handle runs [`DeviceHandle::cleanup`] if it has not run yet.
pub struct DeviceHandle {
    led: Option<Box<dyn StatusLed>>,
    buttons: Option<Box<dyn Buttons>>,
    display: Option<Box<dyn Display>>,
    nfc: Option<Box<dyn NfcFrontend>>,
    wifi: Option<Box<dyn WifiScanner>>,
    bluetooth: Option<Box<dyn BluetoothScanner>>,
    bluetooth_duration: Duration,
    cleaned_up: bool,
}

impl DeviceHandle {
    /// Create a handle with only the mandatory peripherals
    pub fn new(led: Box<dyn StatusLed>, buttons: Box<dyn Buttons>) -> Self {
        Self {
            led: Some(led),
            buttons: Some(buttons),
            display: None,
            nfc: None,
            wifi: None,
            bluetooth: None,
            bluetooth_duration: DEFAULT_BLUETOOTH_DURATION,
            cleaned_up: false,
        }
    }

    /// Open every peripheral from its backend spec
    ///
    /// A GPIO failure is fatal. Any other peripheral that fails to open is
    /// logged and left absent, so a broken display does not stop scanning.
    pub fn open(specs: &BackendSpecs) -> std::result::Result<Self, BoxError> {
        let (led, buttons) = open_gpio(&specs.gpio)?;
        let mut handle = Self::new(led, buttons);

        handle.display = open_display(&specs.display).unwrap_or_else(|e| {
            log::warn!("Display setup failed: {}", e);
            None
        });
        handle.nfc = open_nfc(&specs.nfc).unwrap_or_else(|e| {
            log::error!("NFC setup failed: {}", e);
            None
        });
        handle.wifi = open_wifi(&specs.wifi).unwrap_or_else(|e| {
            log::error!("WiFi setup failed: {}", e);
            None
        });
        handle.bluetooth = open_bluetooth(&specs.bluetooth).unwrap_or_else(|e| {
            log::error!("Bluetooth setup failed: {}", e);
            None
        });

        // Start from a blank panel
        if let Some(display) = handle.display.as_mut() {
            display.clear();
            if let Err(e) = display.flush() {
                log::warn!("Display setup failed: {}", e);
                handle.display = None;
            }
        }

        Ok(handle)
    }

    /// Attach a display
    pub fn with_display(mut self, display: Box<dyn Display>) -> Self {
        self.display = Some(display);
        self
    }

    /// Attach an NFC front end
    pub fn with_nfc(mut self, nfc: Box<dyn NfcFrontend>) -> Self {
        self.nfc = Some(nfc);
        self
    }

    /// Attach a WiFi scanner
    pub fn with_wifi(mut self, wifi: Box<dyn WifiScanner>) -> Self {
        self.wifi = Some(wifi);
        self
    }

    /// Attach a Bluetooth scanner
    pub fn with_bluetooth(mut self, bluetooth: Box<dyn BluetoothScanner>) -> Self {
        self.bluetooth = Some(bluetooth);
        self
    }

    /// Set the inquiry duration used by [`DeviceHandle::advanced_bluetooth_scan`]
    pub fn set_bluetooth_duration(&mut self, duration: Duration) {
        self.bluetooth_duration = duration;
    }

    /// Whether a backend is attached for `peripheral`
    pub fn has(&self, peripheral: Peripheral) -> bool {
        match peripheral {
            Peripheral::Gpio => self.led.is_some(),
            Peripheral::Display => self.display.is_some(),
            Peripheral::Nfc => self.nfc.is_some(),
            Peripheral::Wifi => self.wifi.is_some(),
            Peripheral::Bluetooth => self.bluetooth.is_some(),
        }
    }

    /// Switch the status LED
    pub fn set_led(&mut self, on: bool) -> Result<()> {
        match self.led.as_mut() {
            Some(led) => led.set(on),
            None => Ok(()),
        }
    }

    /// Sample the buttons
    pub fn read_buttons(&mut self) -> Result<Vec<ButtonState>> {
        match self.buttons.as_mut() {
            Some(buttons) => buttons.read(),
            None => Err(Error::backend("gpio", "buttons released by cleanup")),
        }
    }

    /// Scan for WiFi networks
    ///
    /// Errors are logged and reported as an empty result.
    pub fn wifi_scan(&mut self) -> Vec<WifiNetwork> {
        let Some(wifi) = self.wifi.as_mut() else {
            log::debug!("No WiFi scanner configured");
            return Vec::new();
        };

        wifi.scan().unwrap_or_else(|e| {
            log::error!("WiFi scan failed: {}", e);
            Vec::new()
        })
    }

    /// Discover Bluetooth devices, names only
    ///
    /// Errors are logged and reported as an empty result.
    pub fn bluetooth_scan(&mut self) -> Vec<BluetoothDevice> {
        let Some(bluetooth) = self.bluetooth.as_mut() else {
            return Vec::new();
        };

        bluetooth
            .discover(self.bluetooth_duration)
            .unwrap_or_else(|e| {
                log::error!("Bluetooth scan failed: {}", e);
                Vec::new()
            })
    }

    /// Discover Bluetooth devices and browse the services of each
    ///
    /// A device whose service query fails is kept with no services.
    pub fn advanced_bluetooth_scan(&mut self) -> Vec<BluetoothDevice> {
        let mut devices = self.bluetooth_scan();
        let Some(bluetooth) = self.bluetooth.as_mut() else {
            return devices;
        };

        for device in &mut devices {
            device.services = bluetooth
                .find_services(&device.address)
                .unwrap_or_else(|e| {
                    log::debug!("No services for {}: {}", device.address, e);
                    Vec::new()
                });
        }

        devices
    }

    /// Poll the NFC reader once
    pub fn read_nfc(&mut self) -> Result<NfcRead> {
        match self.nfc.as_mut() {
            Some(nfc) => nfc.read(),
            None => Err(Error::backend("nfc", "no NFC reader configured")),
        }
    }

    /// Emulate the RFID tag described by `tag_data`
    ///
    /// Failures are logged here and also returned, so callers can report
    /// them through their exit status.
    pub fn rfid_emulate(&mut self, tag_data: &str) -> Result<EmulationOutcome> {
        log::info!("Emulating RFID tag: {}", tag_data);

        let result = RfidTag::parse(tag_data).and_then(|tag| match self.nfc.as_mut() {
            Some(nfc) => nfc.emulate(&tag),
            None => Err(Error::backend("nfc", "no NFC emulator configured")),
        });

        match &result {
            Ok(EmulationOutcome::Activated) => log::info!("Tag read by a reader"),
            Ok(EmulationOutcome::NoReader) => log::info!("No reader activated the tag"),
            Err(e) => log::error!("RFID emulation failed: {}", e),
        }
        result
    }

    /// Show the latest scan counts on the display
    ///
    /// Does nothing without a display. Errors are logged.
    pub fn update_display(&mut self, wifi: &[WifiNetwork], bluetooth: &[BluetoothDevice]) {
        let Some(display) = self.display.as_mut() else {
            return;
        };

        display.clear();
        display.text(&format!("WiFi: {}", wifi.len()), 0, 0, true);
        display.text(&format!("BT: {}", bluetooth.len()), 0, 10, true);
        if let Err(e) = display.flush() {
            log::error!("Display update failed: {}", e);
        }
    }

    /// Scan WiFi and Bluetooth once, log the counts and update the display
    pub fn scan_once(&mut self) -> ScanReport {
        let wifi = self.wifi_scan();
        let bluetooth = self.advanced_bluetooth_scan();

        log::info!("WiFi: {} networks", wifi.len());
        log::info!("Bluetooth: {} devices", bluetooth.len());

        self.update_display(&wifi, &bluetooth);
        ScanReport { wifi, bluetooth }
    }

    /// Switch the LED off, release the GPIO lines and blank the display
    ///
    /// Only the first call has any effect.
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.cleaned_up = true;
        log::debug!("Cleaning up");

        if let Err(e) = self.set_led(false) {
            log::warn!("Failed to switch LED off: {}", e);
        }
        self.led = None;
        self.buttons = None;

        if let Some(mut display) = self.display.take() {
            display.clear();
            if let Err(e) = display.flush() {
                log::warn!("Failed to blank display: {}", e);
            }
        }
    }

    /// Whether [`DeviceHandle::cleanup`] has run
    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipperpi_core::{BluetoothService, NfcTag, CHAR_HEIGHT};
    use flipperpi_dummy::{
        DummyBluetooth, DummyButtons, DummyDisplay, DummyLed, DummyNfc, DummyWifi,
    };

    struct Probes {
        led: DummyLed,
        display: DummyDisplay,
        nfc: DummyNfc,
        wifi: DummyWifi,
        bluetooth: DummyBluetooth,
    }

    fn dummy_device() -> (DeviceHandle, Probes) {
        let probes = Probes {
            led: DummyLed::new(),
            display: DummyDisplay::new(128, 64),
            nfc: DummyNfc::new(),
            wifi: DummyWifi::sample(),
            bluetooth: DummyBluetooth::sample(),
        };
        let device = DeviceHandle::new(
            Box::new(probes.led.clone()),
            Box::new(DummyButtons::new(&[17, 22, 27])),
        )
        .with_display(Box::new(probes.display.clone()))
        .with_nfc(Box::new(probes.nfc.clone()))
        .with_wifi(Box::new(probes.wifi.clone()))
        .with_bluetooth(Box::new(probes.bluetooth.clone()));
        (device, probes)
    }

    fn bare_device() -> DeviceHandle {
        DeviceHandle::new(
            Box::new(DummyLed::new()),
            Box::new(DummyButtons::new(&[17])),
        )
    }

    #[test]
    fn test_wifi_scan() {
        let (mut device, probes) = dummy_device();
        assert_eq!(device.wifi_scan().len(), 2);

        probes.wifi.fail_next(1);
        assert!(device.wifi_scan().is_empty());
        assert_eq!(device.wifi_scan().len(), 2);
        assert_eq!(probes.wifi.scan_count(), 3);

        assert!(bare_device().wifi_scan().is_empty());
    }

    #[test]
    fn test_bluetooth_scan_attaches_services() {
        let (mut device, probes) = dummy_device();
        device.set_bluetooth_duration(Duration::from_secs(3));

        let devices = device.advanced_bluetooth_scan();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].services.len(), 1);
        assert_eq!(devices[0].services[0].channel, Some(1));
        assert!(devices[1].services.is_empty());
        assert_eq!(probes.bluetooth.discoveries(), vec![Duration::from_secs(3)]);
    }

    #[test]
    fn test_bluetooth_service_failure_is_per_device() {
        let (mut device, probes) = dummy_device();
        probes.bluetooth.set_services(
            "02:00:00:00:10:02",
            vec![BluetoothService {
                name: Some("Audio Sink".to_string()),
                protocol: Some("L2CAP".to_string()),
                channel: None,
            }],
        );
        probes.bluetooth.break_services("02:00:00:00:10:01");

        let devices = device.advanced_bluetooth_scan();
        assert_eq!(devices.len(), 2);
        assert!(devices[0].services.is_empty());
        assert_eq!(devices[1].services.len(), 1);
    }

    #[test]
    fn test_bluetooth_scan_skips_services() {
        let (mut device, _probes) = dummy_device();
        let devices = device.bluetooth_scan();
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| d.services.is_empty()));
    }

    #[test]
    fn test_bluetooth_discovery_failure() {
        let (mut device, probes) = dummy_device();
        probes.bluetooth.set_fail_discovery(true);
        assert!(device.advanced_bluetooth_scan().is_empty());
        assert!(bare_device().advanced_bluetooth_scan().is_empty());
    }

    #[test]
    fn test_rfid_emulate() {
        let (mut device, probes) = dummy_device();

        assert_eq!(
            device.rfid_emulate("04:A1:B2:C3").unwrap(),
            EmulationOutcome::NoReader
        );
        probes.nfc.set_emulation_outcome(EmulationOutcome::Activated);
        assert_eq!(
            device.rfid_emulate("04a1b2c3d4e5f6").unwrap(),
            EmulationOutcome::Activated
        );

        let emulated = probes.nfc.emulated();
        assert_eq!(emulated.len(), 2);
        assert_eq!(emulated[0].uid(), &[0x04, 0xA1, 0xB2, 0xC3]);

        assert!(matches!(
            device.rfid_emulate("not hex"),
            Err(Error::InvalidTagData { .. })
        ));
        assert_eq!(probes.nfc.emulated().len(), 2);
    }

    #[test]
    fn test_rfid_emulate_without_nfc() {
        assert!(matches!(
            bare_device().rfid_emulate("04:A1:B2:C3"),
            Err(Error::Backend {
                peripheral: "nfc",
                ..
            })
        ));
    }

    #[test]
    fn test_read_nfc() {
        let (mut device, probes) = dummy_device();
        assert_eq!(device.read_nfc().unwrap(), NfcRead::NoTag);

        let tag = NfcTag {
            uid: vec![1, 2, 3, 4],
            sens_res: 0x0004,
            sel_res: 0x08,
        };
        probes.nfc.push_read(NfcRead::Tag(tag.clone()));
        assert_eq!(device.read_nfc().unwrap(), NfcRead::Tag(tag));

        assert!(bare_device().read_nfc().is_err());
    }

    #[test]
    fn test_update_display() {
        let (mut device, probes) = dummy_device();
        let wifi = vec![WifiNetwork::named("a"), WifiNetwork::named("b")];
        device.update_display(&wifi, &[]);

        assert_eq!(probes.display.flush_count(), 1);
        let panel = probes.display.panel();
        // Two lines of text, nothing below them
        let first_line = (0..128).any(|x| (0..CHAR_HEIGHT).any(|y| panel.pixel(x, y)));
        let second_line = (0..128).any(|x| (10..18).any(|y| panel.pixel(x, y)));
        let below = (0..128).any(|x| (20..64).any(|y| panel.pixel(x, y)));
        assert!(first_line && second_line && !below);

        // Flush failures are logged, not fatal
        probes.display.set_fail_flush(true);
        device.update_display(&wifi, &[]);
        assert_eq!(probes.display.flush_count(), 1);

        // No display is a no-op
        bare_device().update_display(&wifi, &[]);
    }

    #[test]
    fn test_scan_once() {
        let (mut device, probes) = dummy_device();
        let report = device.scan_once();
        assert_eq!(report.wifi.len(), 2);
        assert_eq!(report.bluetooth.len(), 2);
        assert_eq!(probes.display.flush_count(), 1);
    }

    #[test]
    fn test_cleanup_runs_once() {
        let (mut device, probes) = dummy_device();
        device.set_led(true).unwrap();
        device.update_display(&[], &[]);

        device.cleanup();
        assert!(device.is_cleaned_up());
        assert_eq!(probes.led.history(), vec![true, false]);
        assert_eq!(probes.display.panel().lit_pixels(), 0);
        assert_eq!(probes.display.flush_count(), 2);
        assert!(!device.has(Peripheral::Gpio));
        assert!(device.read_buttons().is_err());

        device.cleanup();
        drop(device);
        assert_eq!(probes.led.history(), vec![true, false]);
        assert_eq!(probes.display.flush_count(), 2);
    }

    #[test]
    fn test_drop_cleans_up() {
        let (device, probes) = dummy_device();
        drop(device);
        assert_eq!(probes.led.history(), vec![false]);
    }

    #[test]
    fn test_backend_specs_set() {
        let mut specs = BackendSpecs::default();
        specs.set(Peripheral::Nfc, "pn532:dev=/dev/ttyAMA0");
        assert_eq!(specs.get(Peripheral::Nfc), "pn532:dev=/dev/ttyAMA0");
        assert_eq!(specs.get(Peripheral::Gpio), "linux_gpio");
    }

    #[test]
    fn test_open_with_dummy_backends() {
        let device = DeviceHandle::open(&BackendSpecs::dummy()).unwrap();
        for peripheral in Peripheral::ALL {
            assert!(device.has(peripheral), "{} missing", peripheral);
        }
    }

    #[test]
    fn test_open_leaves_failed_peripherals_absent() {
        let specs = BackendSpecs {
            display: "nonexistent".to_string(),
            nfc: "none".to_string(),
            ..BackendSpecs::dummy()
        };
        let device = DeviceHandle::open(&specs).unwrap();
        assert!(!device.has(Peripheral::Display));
        assert!(!device.has(Peripheral::Nfc));
        assert!(device.has(Peripheral::Wifi));

        let specs = BackendSpecs {
            gpio: "nonexistent".to_string(),
            ..BackendSpecs::dummy()
        };
        assert!(DeviceHandle::open(&specs).is_err());
    }
}
