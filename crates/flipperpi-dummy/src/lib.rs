//! flipperpi-dummy - In-memory peripherals for testing
//!
//! This crate provides dummy implementations of every peripheral trait so
//! the device can run without a Raspberry Pi attached. It is used by the
//! `dummy` backend of the CLI and throughout the test suites.
//!
//! Each dummy keeps its state behind an `Arc`, so cloning one yields a
//! second handle onto the same peripheral. Tests keep a clone, box the
//! original into the device, and inspect what the device did through the
//! clone afterwards.

use flipperpi_core::error::{Error, Result};
use flipperpi_core::{
    BluetoothDevice, BluetoothScanner, BluetoothService, ButtonState, Buttons, Display,
    EmulationOutcome, FrameBuffer, NfcRead, NfcReader, RfidEmulator, RfidTag, StatusLed,
    WifiNetwork, WifiScanner,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Entries kept in the LED and Bluetooth logs; older ones are dropped
pub const LOG_LIMIT: usize = 64;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record<T>(log: &mut VecDeque<T>, entry: T) {
    if log.len() == LOG_LIMIT {
        log.pop_front();
    }
    log.push_back(entry);
}

// =============================================================================
// LED
// =============================================================================

#[derive(Debug, Default)]
struct LedState {
    on: bool,
    writes: usize,
    history: VecDeque<bool>,
}

/// LED that records every state written to it
#[derive(Debug, Clone, Default)]
pub struct DummyLed {
    state: Arc<Mutex<LedState>>,
}

impl DummyLed {
    /// Create an LED that starts off
    pub fn new() -> Self {
        Self::default()
    }

    /// The last [`LOG_LIMIT`] values passed to `set`, oldest first
    pub fn history(&self) -> Vec<bool> {
        lock(&self.state).history.iter().copied().collect()
    }

    /// Number of `set` calls so far
    pub fn writes(&self) -> usize {
        lock(&self.state).writes
    }
}

impl StatusLed for DummyLed {
    fn set(&mut self, on: bool) -> Result<()> {
        log::trace!("dummy: LED {}", if on { "on" } else { "off" });
        let mut state = lock(&self.state);
        state.on = on;
        state.writes += 1;
        record(&mut state.history, on);
        Ok(())
    }

    fn is_on(&self) -> bool {
        lock(&self.state).on
    }
}

// =============================================================================
// Buttons
// =============================================================================

/// Button bank whose presses are set programmatically
#[derive(Debug, Clone)]
pub struct DummyButtons {
    pins: Vec<u32>,
    pressed: Arc<Mutex<HashSet<u32>>>,
}

impl DummyButtons {
    /// Create a bank with the given pins, none pressed
    pub fn new(pins: &[u32]) -> Self {
        Self {
            pins: pins.to_vec(),
            pressed: Arc::default(),
        }
    }

    /// Hold a button down
    pub fn press(&self, pin: u32) {
        lock(&self.pressed).insert(pin);
    }

    /// Let a button go
    pub fn release(&self, pin: u32) {
        lock(&self.pressed).remove(&pin);
    }
}

impl Buttons for DummyButtons {
    fn read(&mut self) -> Result<Vec<ButtonState>> {
        let pressed = lock(&self.pressed);
        Ok(self
            .pins
            .iter()
            .map(|&pin| ButtonState {
                pin,
                pressed: pressed.contains(&pin),
            })
            .collect())
    }
}

// =============================================================================
// Display
// =============================================================================

#[derive(Debug)]
struct DisplayState {
    draw: FrameBuffer,
    panel: FrameBuffer,
    flushes: usize,
    fail_flush: bool,
}

/// Display that keeps the last flushed frame in memory
#[derive(Debug, Clone)]
pub struct DummyDisplay {
    state: Arc<Mutex<DisplayState>>,
}

impl DummyDisplay {
    /// Create a blank display
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(DisplayState {
                draw: FrameBuffer::new(width, height),
                panel: FrameBuffer::new(width, height),
                flushes: 0,
                fail_flush: false,
            })),
        }
    }

    /// What the panel currently shows
    pub fn panel(&self) -> FrameBuffer {
        lock(&self.state).panel.clone()
    }

    /// Number of successful flushes
    pub fn flush_count(&self) -> usize {
        lock(&self.state).flushes
    }

    /// Make subsequent flushes fail, as if the I2C bus went away
    pub fn set_fail_flush(&self, fail: bool) {
        lock(&self.state).fail_flush = fail;
    }
}

impl Display for DummyDisplay {
    fn width(&self) -> u32 {
        lock(&self.state).draw.width()
    }

    fn height(&self) -> u32 {
        lock(&self.state).draw.height()
    }

    fn clear(&mut self) {
        lock(&self.state).draw.fill(false);
    }

    fn text(&mut self, text: &str, x: i32, y: i32, on: bool) {
        lock(&self.state).draw.text(text, x, y, on);
    }

    fn flush(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_flush {
            return Err(Error::backend("display", "dummy flush failure"));
        }
        state.panel = state.draw.clone();
        state.flushes += 1;
        Ok(())
    }
}

// =============================================================================
// NFC
// =============================================================================

#[derive(Debug)]
struct NfcState {
    reads: VecDeque<NfcRead>,
    emulated: Vec<RfidTag>,
    outcome: EmulationOutcome,
}

/// NFC front end fed from a queue of canned reads
///
/// With an empty queue every read reports [`NfcRead::NoTag`].
#[derive(Debug, Clone)]
pub struct DummyNfc {
    state: Arc<Mutex<NfcState>>,
}

impl Default for DummyNfc {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(NfcState {
                reads: VecDeque::new(),
                emulated: Vec::new(),
                outcome: EmulationOutcome::NoReader,
            })),
        }
    }
}

impl DummyNfc {
    /// Create a reader with nothing in the field
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for a future `read`
    pub fn push_read(&self, read: NfcRead) {
        lock(&self.state).reads.push_back(read);
    }

    /// Outcome reported by subsequent emulations
    pub fn set_emulation_outcome(&self, outcome: EmulationOutcome) {
        lock(&self.state).outcome = outcome;
    }

    /// Tags passed to `emulate`, in order
    pub fn emulated(&self) -> Vec<RfidTag> {
        lock(&self.state).emulated.clone()
    }
}

impl NfcReader for DummyNfc {
    fn read(&mut self) -> Result<NfcRead> {
        Ok(lock(&self.state).reads.pop_front().unwrap_or(NfcRead::NoTag))
    }
}

impl RfidEmulator for DummyNfc {
    fn emulate(&mut self, tag: &RfidTag) -> Result<EmulationOutcome> {
        let mut state = lock(&self.state);
        state.emulated.push(tag.clone());
        Ok(state.outcome)
    }
}

// =============================================================================
// WiFi
// =============================================================================

#[derive(Debug, Default)]
struct WifiState {
    networks: Vec<WifiNetwork>,
    failures: usize,
    scans: usize,
}

/// WiFi scanner returning a fixed list of networks
#[derive(Debug, Clone, Default)]
pub struct DummyWifi {
    state: Arc<Mutex<WifiState>>,
}

impl DummyWifi {
    /// Create a scanner that always finds `networks`
    pub fn new(networks: Vec<WifiNetwork>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WifiState {
                networks,
                ..Default::default()
            })),
        }
    }

    /// A small neighbourhood for demos
    pub fn sample() -> Self {
        Self::new(vec![
            WifiNetwork {
                ssid: "DummyNet".into(),
                bssid: Some("02:00:00:00:00:01".into()),
                channel: Some(6),
                quality: Some((60, 70)),
                signal_dbm: Some(-50),
                encrypted: Some(true),
            },
            WifiNetwork {
                ssid: "FlipperPi-Guest".into(),
                bssid: Some("02:00:00:00:00:02".into()),
                channel: Some(11),
                quality: Some((30, 70)),
                signal_dbm: Some(-80),
                encrypted: Some(false),
            },
        ])
    }

    /// Make the next `n` scans fail
    pub fn fail_next(&self, n: usize) {
        lock(&self.state).failures = n;
    }

    /// Number of scans attempted
    pub fn scan_count(&self) -> usize {
        lock(&self.state).scans
    }
}

impl WifiScanner for DummyWifi {
    fn scan(&mut self) -> Result<Vec<WifiNetwork>> {
        let mut state = lock(&self.state);
        state.scans += 1;
        if state.failures > 0 {
            state.failures -= 1;
            return Err(Error::backend("wifi", "dummy scan failure"));
        }
        Ok(state.networks.clone())
    }
}

// =============================================================================
// Bluetooth
// =============================================================================

#[derive(Debug, Default)]
struct BluetoothState {
    devices: Vec<BluetoothDevice>,
    services: HashMap<String, Vec<BluetoothService>>,
    broken: HashSet<String>,
    discovery_count: usize,
    discoveries: VecDeque<Duration>,
    fail_discovery: bool,
}

/// Bluetooth scanner with canned devices and service records
#[derive(Debug, Clone, Default)]
pub struct DummyBluetooth {
    state: Arc<Mutex<BluetoothState>>,
}

impl DummyBluetooth {
    /// Create a scanner that discovers `devices`
    pub fn new(devices: Vec<BluetoothDevice>) -> Self {
        Self {
            state: Arc::new(Mutex::new(BluetoothState {
                devices,
                ..Default::default()
            })),
        }
    }

    /// One phone with a serial port service
    pub fn sample() -> Self {
        let bt = Self::new(vec![
            BluetoothDevice::new("02:00:00:00:10:01", Some("Dummy Phone")),
            BluetoothDevice::new("02:00:00:00:10:02", None),
        ]);
        bt.set_services(
            "02:00:00:00:10:01",
            vec![BluetoothService {
                name: Some("Serial Port".into()),
                protocol: Some("RFCOMM".into()),
                channel: Some(1),
            }],
        );
        bt
    }

    /// Service records returned for `address`
    pub fn set_services(&self, address: &str, services: Vec<BluetoothService>) {
        lock(&self.state)
            .services
            .insert(address.to_string(), services);
    }

    /// Make service lookups for `address` fail
    pub fn break_services(&self, address: &str) {
        lock(&self.state).broken.insert(address.to_string());
    }

    /// Make discovery fail
    pub fn set_fail_discovery(&self, fail: bool) {
        lock(&self.state).fail_discovery = fail;
    }

    /// Durations of the last [`LOG_LIMIT`] discoveries, oldest first
    pub fn discoveries(&self) -> Vec<Duration> {
        lock(&self.state).discoveries.iter().copied().collect()
    }

    /// Number of `discover` calls so far
    pub fn discovery_count(&self) -> usize {
        lock(&self.state).discovery_count
    }
}

impl BluetoothScanner for DummyBluetooth {
    fn discover(&mut self, duration: Duration) -> Result<Vec<BluetoothDevice>> {
        let mut state = lock(&self.state);
        state.discovery_count += 1;
        record(&mut state.discoveries, duration);
        if state.fail_discovery {
            return Err(Error::backend("bluetooth", "dummy discovery failure"));
        }
        Ok(state.devices.clone())
    }

    fn find_services(&mut self, address: &str) -> Result<Vec<BluetoothService>> {
        let state = lock(&self.state);
        if state.broken.contains(address) {
            return Err(Error::backend("bluetooth", "dummy service lookup failure"));
        }
        Ok(state.services.get(address).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_led_clone_shares_state() {
        let probe = DummyLed::new();
        let mut led = probe.clone();
        led.set(true).unwrap();
        led.set(false).unwrap();
        assert_eq!(probe.history(), vec![true, false]);
        assert!(!probe.is_on());
    }

    #[test]
    fn test_led_history_is_bounded() {
        let probe = DummyLed::new();
        let mut led = probe.clone();
        for i in 0..LOG_LIMIT * 3 + 1 {
            led.set(i % 2 == 0).unwrap();
        }
        let history = probe.history();
        assert_eq!(history.len(), LOG_LIMIT);
        assert_eq!(history.last(), Some(&true));
        assert_eq!(probe.writes(), LOG_LIMIT * 3 + 1);
        assert!(probe.is_on());
    }

    #[test]
    fn test_buttons_press_release() {
        let probe = DummyButtons::new(&[17, 22, 27]);
        let mut buttons = probe.clone();
        probe.press(22);
        let states = buttons.read().unwrap();
        assert_eq!(
            states.iter().map(|s| s.pressed).collect::<Vec<_>>(),
            [false, true, false]
        );
        probe.release(22);
        assert!(buttons.read().unwrap().iter().all(|s| !s.pressed));
    }

    #[test]
    fn test_display_flush_copies_frame() {
        let probe = DummyDisplay::new(128, 64);
        let mut display = probe.clone();
        display.text("Hi", 0, 0, true);
        assert_eq!(probe.panel().lit_pixels(), 0);
        display.flush().unwrap();
        assert!(probe.panel().lit_pixels() > 0);
        assert_eq!(probe.flush_count(), 1);

        probe.set_fail_flush(true);
        display.clear();
        assert!(display.flush().is_err());
        // Panel keeps the last good frame
        assert!(probe.panel().lit_pixels() > 0);
    }

    #[test]
    fn test_nfc_queue_then_no_tag() {
        let probe = DummyNfc::new();
        let mut nfc = probe.clone();
        let tag = flipperpi_core::NfcTag {
            uid: vec![1, 2, 3, 4],
            sens_res: 0x0004,
            sel_res: 0x08,
        };
        probe.push_read(NfcRead::Tag(tag.clone()));
        assert_eq!(nfc.read().unwrap(), NfcRead::Tag(tag));
        assert_eq!(nfc.read().unwrap(), NfcRead::NoTag);
    }

    #[test]
    fn test_wifi_failures_then_recover() {
        let probe = DummyWifi::sample();
        let mut wifi = probe.clone();
        probe.fail_next(1);
        assert!(wifi.scan().is_err());
        assert_eq!(wifi.scan().unwrap().len(), 2);
        assert_eq!(probe.scan_count(), 2);
    }

    #[test]
    fn test_bluetooth_services() {
        let probe = DummyBluetooth::sample();
        let mut bt = probe.clone();
        let devices = bt.discover(Duration::from_secs(8)).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(bt.find_services(&devices[0].address).unwrap().len(), 1);
        assert!(bt.find_services(&devices[1].address).unwrap().is_empty());

        probe.break_services(&devices[0].address);
        assert!(bt.find_services(&devices[0].address).is_err());
        assert_eq!(probe.discoveries(), vec![Duration::from_secs(8)]);

        for secs in 0..LOG_LIMIT as u64 + 10 {
            bt.discover(Duration::from_secs(secs)).unwrap();
        }
        let discoveries = probe.discoveries();
        assert_eq!(discoveries.len(), LOG_LIMIT);
        assert_eq!(discoveries[0], Duration::from_secs(10));
        assert_eq!(probe.discovery_count(), LOG_LIMIT + 11);
    }
}
