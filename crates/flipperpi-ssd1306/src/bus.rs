//! I2C transport
//!
//! The driver only ever writes to the panel, so the bus abstraction is a
//! single write of one I2C message.

use crate::error::{Result, Ssd1306Error};

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::io::AsRawFd;

/// Linux i2c-dev ioctl constants
mod ioctl {
    use nix::ioctl_write_int_bad;

    /// Select the slave address for subsequent read/write calls
    const I2C_SLAVE: u16 = 0x0703;

    ioctl_write_int_bad!(i2c_slave, I2C_SLAVE);
}

/// Write-only I2C bus
pub trait I2cBus: Send {
    /// Write one I2C message to the selected device
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// I2C adapter opened through `/dev/i2c-N`
pub struct LinuxI2c {
    file: File,
}

impl LinuxI2c {
    /// Open `path` and address the device at `addr` (7-bit)
    pub fn open(path: &str, addr: u16) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| Ssd1306Error::OpenFailed {
                path: path.to_string(),
                source,
            })?;

        // SAFETY: the fd is valid for the lifetime of `file` and I2C_SLAVE
        // takes the address by value.
        unsafe { ioctl::i2c_slave(file.as_raw_fd(), addr as libc::c_int) }.map_err(
            |errno| Ssd1306Error::SetAddressFailed {
                addr,
                source: std::io::Error::from(errno),
            },
        )?;

        log::debug!("ssd1306: Opened {} at address 0x{:02X}", path, addr);

        Ok(Self { file })
    }
}

impl I2cBus for LinuxI2c {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes).map_err(Ssd1306Error::WriteFailed)
    }
}
