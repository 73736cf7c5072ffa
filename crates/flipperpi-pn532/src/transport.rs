//! Transport layer abstraction for PN532 communication
//!
//! The PN532 speaks the same frames over HSU (UART), I2C and SPI. Only the
//! UART link is implemented, but the device code is written against this
//! trait so tests can script the chip's answers.

use crate::error::Result;
use std::time::Duration;

/// Transport trait for reading and writing bytes
pub trait Transport: Send {
    /// Write all bytes to the transport
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Read exactly `buf.len()` bytes, waiting at most `timeout`
    ///
    /// Returns [`crate::Pn532Error::Timeout`] if the bytes do not arrive in
    /// time.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()>;

    /// Drop any bytes received but not yet read
    fn clear_input(&mut self) -> Result<()>;
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};

    /// Default HSU baud rate of the PN532
    pub const DEFAULT_BAUD: u32 = 115_200;

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
    }

    impl SerialTransport {
        /// Open a serial port with the specified baud rate
        ///
        /// If baud is None, uses the PN532 default of 115200.
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud_rate = baud.unwrap_or(DEFAULT_BAUD);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_secs(1))
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self { port })
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data)?;
            self.port.flush()?;
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<()> {
            self.port.set_timeout(timeout)?;
            self.port.read_exact(buf)?;
            Ok(())
        }

        fn clear_input(&mut self) -> Result<()> {
            self.port.clear(ClearBuffer::Input)?;
            Ok(())
        }
    }
}
