use std::thread;
use std::time::Duration;

use super::{Result, SerialPortIO};

/// Inter-byte timing the console needs to keep up with typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Delay before every byte (device polls its UART slowly)
    pub byte_delay: Duration,
    /// Extra delay after a carriage return while the menu redraws
    pub cr_settle: Duration,
    /// Delay after a single-key menu selection that has no carriage return
    pub key_settle: Duration,
}

impl Pacing {
    pub const fn new(byte_delay: Duration, cr_settle: Duration, key_settle: Duration) -> Self {
        Self { byte_delay, cr_settle, key_settle }
    }

    /// No delays at all. Only useful against simulated channels.
    pub const fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(10), Duration::from_millis(100), Duration::from_millis(250))
    }
}

pub(crate) fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

/// Types text into the console one byte at a time, checking the echo.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacedWriter {
    pacing: Pacing,
}

impl PacedWriter {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Send `text` byte by byte.
    ///
    /// Bytes already sitting at the front of `echo` are taken as the device's
    /// echo of what we type and are removed from it; once it runs dry the echo
    /// is read back from the channel and compared. A wrong or missing echo is
    /// only logged.
    pub fn write<C>(&self, channel: &mut C, echo: &mut Vec<u8>, text: &str) -> Result<()>
    where
        C: SerialPortIO + ?Sized,
    {
        let mut buffered = 0;

        for &byte in text.as_bytes() {
            pause(self.pacing.byte_delay);
            channel.write_bytes(&[byte])?;
            if byte == b'\r' {
                pause(self.pacing.cr_settle);
            }

            if buffered < echo.len() {
                buffered += 1;
                continue;
            }

            match channel.read_byte()? {
                Some(got) if got == byte => {}
                Some(got) => log::warn!("Echo mismatch: wrote {}, got back {}", byte, got),
                None => log::warn!("Echo missing: wrote {}, read timed out", byte),
            }
        }

        echo.drain(..buffered);
        Ok(())
    }

    /// `write` followed by a carriage return
    pub fn write_line<C>(&self, channel: &mut C, echo: &mut Vec<u8>, text: &str) -> Result<()>
    where
        C: SerialPortIO + ?Sized,
    {
        self.write(channel, echo, &format!("{}\r", text))
    }
}
