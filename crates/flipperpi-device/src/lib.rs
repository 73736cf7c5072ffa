//! Device assembly for flipperpi
//!
//! This crate ties the peripheral backends together. The CLI only interacts
//! with types from this crate and `flipperpi-core`, never directly with a
//! backend crate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLI (bin/flipperpi)                     │
//! │  - Loads the configuration, picks backend spec strings       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  flipperpi-device (this crate)               │
//! │  - Registry: opens backends by spec string                   │
//! │  - DeviceHandle: device operations over boxed peripherals    │
//! │  - ContinuousScanner: the scan cycle thread                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │    flipperpi-core        │   │  Backend crates          │
//! │  - Peripheral traits     │   │  - linux-gpio, ssd1306,  │
//! │  - Parsers, framebuffer  │   │    pn532, linux-scan,    │
//! │                          │   │    dummy                 │
//! └──────────────────────────┘   └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use flipperpi_device::{BackendSpecs, DeviceHandle};
//!
//! let mut device = DeviceHandle::open(&BackendSpecs::dummy())?;
//! let report = device.scan_once();
//! assert_eq!(report.wifi.len(), 2);
//! device.cleanup();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod handle;
mod registry;
mod scanner;

pub use handle::{BackendSpecs, DeviceHandle, DEFAULT_BLUETOOTH_DURATION};
pub use registry::{
    available_backends, backend_names_short, open_bluetooth, open_display, open_gpio, open_nfc,
    open_wifi, parse_backend_params, BackendInfo, BackendParams, BoxError, BoxedGpio, Peripheral,
};
pub use scanner::{run_cycle, scan_loop, ContinuousScanner, ScanSummary, ScanTiming, StopSignal};
