use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::dialog::{self, AutomatonState, Exchange};
use crate::serial::{PacedWriter, Result, SerialError, SerialPortIO};
use crate::telemetry::{self, Reading, TimedReading};

/// Bytes kept while waiting for something recognisable
pub const BUFFER_LIMIT: usize = 256;
/// Read timeouts in a row that end the session
pub const MAX_CONSECUTIVE_TIMEOUTS: u32 = 2;
/// Switches the console into extended info mode, which redraws the menu
pub const EXTENDED_INFO_COMMAND: &str = "x";

/// Drives one console connection: reads bytes, turns status lines into
/// readings and answers menu prompts.
///
/// Runs on a blocking thread. The reading queue closes when `run` returns,
/// whatever the reason.
pub struct SessionDriver<C> {
    id: Uuid,
    channel: C,
    writer: PacedWriter,
    buffer: Vec<u8>,
    state: AutomatonState,
    readings: mpsc::Sender<TimedReading>,
    stop: oneshot::Receiver<()>,
}

impl<C: SerialPortIO> SessionDriver<C> {
    pub fn new(
        channel: C,
        writer: PacedWriter,
        readings: mpsc::Sender<TimedReading>,
        stop: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            writer,
            buffer: Vec::with_capacity(BUFFER_LIMIT + 1),
            state: AutomatonState::new(),
            readings,
            stop,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run until stopped, stalled, or the reading consumer goes away.
    ///
    /// A stop request (or a dropped stop sender) ends the session with `Ok`.
    /// The stop signal is only checked between reads, so an in-flight read
    /// or reply finishes first.
    pub fn run(mut self) -> Result<()> {
        log::info!("Session {} streaming", self.id);
        let mut timeouts = 0;

        loop {
            match self.stop.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                    log::info!("Session {} stopped", self.id);
                    return Ok(());
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
            }

            let Some(byte) = self.channel.read_byte()? else {
                timeouts += 1;
                if timeouts >= MAX_CONSECUTIVE_TIMEOUTS {
                    log::error!("Session {}: device silent after {} read timeouts", self.id, timeouts);
                    return Err(SerialError::Stalled(timeouts));
                }
                log::warn!("Session {}: read timeout, trying pressing enter", self.id);
                self.writer.write(&mut self.channel, &mut Vec::new(), "\r")?;
                continue;
            };
            timeouts = 0;

            self.push(byte);
            self.drain()?;
        }
    }

    fn push(&mut self, byte: u8) {
        self.buffer.push(byte);
        if self.buffer.len() > BUFFER_LIMIT {
            let excess = self.buffer.len() - BUFFER_LIMIT;
            self.buffer.drain(..excess);
        }
    }

    /// Extract everything the buffer currently allows: status lines first,
    /// then prompts, until neither makes progress.
    fn drain(&mut self) -> Result<()> {
        loop {
            log::trace!("buffer {:?}", String::from_utf8_lossy(&self.buffer));

            let (reading, consumed) = telemetry::try_parse(&self.buffer);
            if consumed > 0 {
                self.buffer.drain(..consumed);
                if let Some(reading) = reading {
                    self.emit(reading)?;
                }
                continue;
            }

            match dialog::try_respond(&mut self.channel, &mut self.buffer, &mut self.state, &self.writer)? {
                Exchange::NoMatch => return Ok(()),
                Exchange::Consumed => {}
                Exchange::Answered(label) => log::info!("{}", label),
            }
        }
    }

    /// Queue a reading, waiting for room if the consumer is behind
    fn emit(&mut self, reading: Reading) -> Result<()> {
        self.readings
            .blocking_send(TimedReading::now(reading))
            .map_err(|_| SerialError::QueueClosed)?;

        if self.state.pending_reconfigure {
            log::info!("Requesting extended info to reconfigure charger");
            self.writer.write(&mut self.channel, &mut self.buffer, EXTENDED_INFO_COMMAND)?;
            self.state.pending_reconfigure = false;
        }
        Ok(())
    }
}
