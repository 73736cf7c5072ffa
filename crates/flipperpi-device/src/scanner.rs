//! Continuous scanning on a background thread
//!
//! One scan cycle:
//!
//! ```text
//! LED on -> WiFi scan -> Bluetooth scan -> log counts -> update display
//!        -> wait interval -> LED off -> wait led_off
//! ```
//!
//! A failing cycle is logged and followed by `error_backoff` before the next
//! one starts. Every wait wakes early when a stop is requested.

use crate::handle::DeviceHandle;
use flipperpi_core::error::{Error, Result};
use flipperpi_core::ScanReport;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Timing of the scan cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTiming {
    /// Time the LED stays on after a scan
    pub interval: Duration,
    /// Time the LED stays off before the next scan
    pub led_off: Duration,
    /// Pause after a failed cycle
    pub error_backoff: Duration,
}

impl Default for ScanTiming {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            led_off: Duration::from_secs(2),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// Shared stop request that sleeping waiters notice immediately
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// Create a signal with no stop requested
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self) -> MutexGuard<'_, bool> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request a stop and wake every waiter
    pub fn request(&self) {
        *self.flag() = true;
        self.inner.1.notify_all();
    }

    /// Whether a stop has been requested
    pub fn is_requested(&self) -> bool {
        *self.flag()
    }

    /// Sleep for `timeout` unless a stop is requested first
    ///
    /// Returns true if the wait ended because of a stop request. A timeout
    /// too large to represent as a deadline waits for the stop alone.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut stopped = self.flag();
        while !*stopped {
            stopped = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    self.inner
                        .1
                        .wait_timeout(stopped, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .inner
                    .1
                    .wait(stopped)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
        true
    }
}

/// What a scanner thread did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Cycles started
    pub cycles: u64,
    /// Cycles that failed
    pub errors: u64,
    /// Result of the last successful cycle
    pub last: Option<ScanReport>,
}

/// Run one scan cycle
pub fn run_cycle(
    device: &mut DeviceHandle,
    timing: &ScanTiming,
    stop: &StopSignal,
) -> Result<ScanReport> {
    device.set_led(true)?;
    let report = device.scan_once();
    stop.wait(timing.interval);
    device.set_led(false)?;
    stop.wait(timing.led_off);
    Ok(report)
}

/// Run scan cycles until `stop` is requested or `max_cycles` have run
pub fn scan_loop(
    device: &mut DeviceHandle,
    timing: &ScanTiming,
    max_cycles: Option<u64>,
    stop: &StopSignal,
) -> ScanSummary {
    let mut summary = ScanSummary::default();

    while !stop.is_requested() && max_cycles.map_or(true, |max| summary.cycles < max) {
        summary.cycles += 1;
        log::debug!("Scan cycle {}", summary.cycles);

        match run_cycle(device, timing, stop) {
            Ok(report) => summary.last = Some(report),
            Err(e) => {
                summary.errors += 1;
                log::error!("Scan cycle failed: {}", e);
                stop.wait(timing.error_backoff);
            }
        }
    }

    log::info!(
        "Scanning stopped after {} cycle(s), {} failed",
        summary.cycles,
        summary.errors
    );
    summary
}

/// Scan cycle running on a background thread
///
/// The thread owns the device while it runs and hands it back from
/// [`ContinuousScanner::join`], so the caller decides when to clean up.
pub struct ContinuousScanner {
    stop: StopSignal,
    thread: Option<JoinHandle<(DeviceHandle, ScanSummary)>>,
}

impl ContinuousScanner {
    /// Start scanning on a new thread
    ///
    /// With `max_cycles` set, the thread stops by itself after that many
    /// cycles.
    pub fn start(
        mut device: DeviceHandle,
        timing: ScanTiming,
        max_cycles: Option<u64>,
    ) -> Result<Self> {
        let stop = StopSignal::new();
        let thread_stop = stop.clone();

        let thread = thread::Builder::new()
            .name("flipperpi-scan".to_string())
            .spawn(move || {
                let summary = scan_loop(&mut device, &timing, max_cycles, &thread_stop);
                (device, summary)
            })?;

        log::info!(
            "Continuous scan started (interval {:?}, LED off {:?})",
            timing.interval,
            timing.led_off
        );

        Ok(Self {
            stop,
            thread: Some(thread),
        })
    }

    /// Handle for requesting a stop from elsewhere
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Ask the thread to stop after the current step
    pub fn stop(&self) {
        self.stop.request();
    }

    /// Whether the thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Wait for the thread to exit and take back the device
    pub fn join(mut self) -> Result<(DeviceHandle, ScanSummary)> {
        let thread = self
            .thread
            .take()
            .ok_or_else(|| Error::backend("scanner", "scan thread already joined"))?;
        thread
            .join()
            .map_err(|_| Error::backend("scanner", "scan thread panicked"))
    }
}

impl Drop for ContinuousScanner {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.stop.request();
            let _ = thread.join();
        }
    }
}
