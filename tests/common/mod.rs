#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

enum Step {
    Byte(u8),
    Timeout,
}

/// In-memory console: replays scripted input, optionally echoes what is
/// typed, and records everything written.
pub struct ScriptedPort {
    script: VecDeque<Step>,
    echo: VecDeque<u8>,
    auto_echo: bool,
    written: Arc<Mutex<Vec<u8>>>,
}

impl ScriptedPort {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            echo: VecDeque::new(),
            auto_echo: false,
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Echo every written byte back before any further scripted input
    pub fn echoing(mut self) -> Self {
        self.auto_echo = true;
        self
    }

    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.script.extend(data.iter().map(|&b| Step::Byte(b)));
        self
    }

    pub fn timeout(mut self) -> Self {
        self.script.push_back(Step::Timeout);
        self
    }

    /// Handle to the bytes written, usable after the port is moved away
    pub fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }
}

impl Read for ScriptedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(b) = self.echo.pop_front() {
            buf[0] = b;
            return Ok(1);
        }
        match self.script.pop_front() {
            Some(Step::Byte(b)) => {
                buf[0] = b;
                Ok(1)
            }
            Some(Step::Timeout) | None => Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")),
        }
    }
}

impl Write for ScriptedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(buf);
        if self.auto_echo {
            self.echo.extend(buf.iter().copied());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn written_string(written: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&written.lock().unwrap()).into_owned()
}
