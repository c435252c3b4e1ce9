use std::io::{self, Read, Write};
use std::time::Duration;
use serialport::{DataBits, Parity, SerialPort, StopBits};

use super::{Result, SerialError};

pub const DEFAULT_PORT: &str = "/dev/pwrgate";
pub const BAUD_RATE: u32 = 115200;
pub const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Owned connection to the charge controller's console port.
pub struct SerialInterface {
    port: Box<dyn SerialPort>,
    port_name: String,
}

impl SerialInterface {
    /// Open the console port with 8N1 framing and a blocking read timeout
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => SerialError::PortNotFound(port_name.to_string()),
                _ => SerialError::ConnectionFailed(format!("{}: {}", port_name, e)),
            })?;

        log::info!("Connected to charge controller on {} at {} baud", port_name, baud_rate);
        Ok(Self {
            port,
            port_name: port_name.to_string(),
        })
    }
}

impl Read for SerialInterface {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialInterface {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

impl Drop for SerialInterface {
    fn drop(&mut self) {
        log::info!("Disconnecting from {}", self.port_name);
    }
}
