pub mod driver;

pub use driver::{SessionDriver, BUFFER_LIMIT, EXTENDED_INFO_COMMAND, MAX_CONSECUTIVE_TIMEOUTS};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::serial::{PacedWriter, Pacing, Result, SerialError, SerialPortIO};
use crate::telemetry::TimedReading;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

pub struct SessionBuilder<C> {
    channel: C,
    pacing: Pacing,
    queue_capacity: usize,
}

impl<C> SessionBuilder<C>
where
    C: SerialPortIO + 'static,
{
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            pacing: Pacing::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Wire up the driver without starting it
    pub fn build(self) -> (SessionDriver<C>, oneshot::Sender<()>, mpsc::Receiver<TimedReading>) {
        let (readings_tx, readings_rx) = mpsc::channel(self.queue_capacity);
        let (stop_tx, stop_rx) = oneshot::channel();
        let driver = SessionDriver::new(self.channel, PacedWriter::new(self.pacing), readings_tx, stop_rx);
        (driver, stop_tx, readings_rx)
    }

    /// Start the driver on the blocking pool. Must be called inside a tokio runtime.
    pub fn spawn(self) -> (SessionHandle, mpsc::Receiver<TimedReading>) {
        let (driver, stop_tx, readings_rx) = self.build();
        let id = driver.id();
        let task = tokio::task::spawn_blocking(move || driver.run());
        (
            SessionHandle {
                id,
                stop_tx: Some(stop_tx),
                task,
            },
            readings_rx,
        )
    }
}

/// Owner's side of a running session. Dropping it also stops the session.
pub struct SessionHandle {
    id: Uuid,
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the session to finish after its current read
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// The driver has returned, for whatever reason
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end and report why
    pub async fn wait(&mut self) -> Result<()> {
        (&mut self.task)
            .await
            .map_err(|e| SerialError::TaskFailed(e.to_string()))?
    }
}
