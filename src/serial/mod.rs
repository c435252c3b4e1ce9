pub mod interface;
pub mod writer;

pub use interface::SerialInterface;
pub use writer::{Pacing, PacedWriter};

use std::io::{ErrorKind, Read, Write};

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("Port not found: {0}")]
    PortNotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Device stalled: no data after {0} consecutive read timeouts")]
    Stalled(u32),

    #[error("Reading queue closed by consumer")]
    QueueClosed,

    #[error("Session task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialport error: {0}")]
    SerialportError(#[from] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;

/// Byte-level duplex channel the session runs over.
///
/// `read_byte` returns `Ok(None)` when the channel's read timeout expires
/// without data; every other failure is an error.
pub trait SerialPortIO: Send {
    fn read_byte(&mut self) -> Result<Option<u8>>;
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;
}

impl<T> SerialPortIO for T
where
    T: Read + Write + Send + ?Sized,
{
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(ref e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(SerialError::IoError(e)),
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.write_all(data)?;
        self.flush()?;
        Ok(())
    }
}
