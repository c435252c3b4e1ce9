pub mod prompts;

pub use prompts::{Action, Effect, Prompt, PROMPTS};

use crate::serial::writer::pause;
use crate::serial::{PacedWriter, Result, SerialPortIO};

/// Per-session menu state, threaded through every dialog step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutomatonState {
    /// "Press S to Review/Edit" has already been answered
    pub prompted_review_edit: bool,
    /// Send the extended-info command after the next status line
    pub pending_reconfigure: bool,
}

impl AutomatonState {
    /// State at the start of a streaming session. A reconfigure is forced so
    /// the first status line walks the device through its menu.
    pub fn new() -> Self {
        Self {
            prompted_review_edit: false,
            pending_reconfigure: true,
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::ClearReviewEdit => self.prompted_review_edit = false,
            Effect::BeginRun => {
                self.prompted_review_edit = false;
                self.pending_reconfigure = false;
            }
            Effect::ArmReconfigure => {
                self.prompted_review_edit = false;
                self.pending_reconfigure = true;
            }
        }
    }
}

impl Default for AutomatonState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one dialog step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// No known prompt in the buffer
    NoMatch,
    /// A prompt or info line was swallowed without replying
    Consumed,
    /// A prompt was answered; the label names it for the log
    Answered(&'static str),
}

impl Exchange {
    pub fn matched(&self) -> bool {
        !matches!(self, Exchange::NoMatch)
    }
}

/// Recognise the first known prompt in `buffer`, consume it (and anything
/// before it) and reply through `writer`.
///
/// The remainder of `buffer` doubles as the echo source for the reply, so
/// echoed characters that already arrived are removed from it as well.
pub fn try_respond<C>(
    channel: &mut C,
    buffer: &mut Vec<u8>,
    state: &mut AutomatonState,
    writer: &PacedWriter,
) -> Result<Exchange>
where
    C: SerialPortIO + ?Sized,
{
    let leading = buffer.iter().take_while(|&&b| b == b'\n' || b == b'\r').count();
    buffer.drain(..leading);
    if buffer.is_empty() {
        return Ok(Exchange::NoMatch);
    }

    let Some((prompt, end)) = PROMPTS
        .iter()
        .find_map(|prompt| prompt.pattern.find(buffer.as_slice()).map(|m| (prompt, m.end())))
    else {
        return Ok(Exchange::NoMatch);
    };

    log::debug!("Prompt {:?} in {:?}", prompt.label, String::from_utf8_lossy(&buffer[..]));
    buffer.drain(..end);

    match prompt.action {
        Action::Skip => Ok(Exchange::Consumed),
        Action::ReviewEdit => {
            if state.prompted_review_edit {
                return Ok(Exchange::Consumed);
            }
            state.prompted_review_edit = true;
            writer.write(channel, buffer, "s")?;
            pause(writer.pacing().key_settle);
            Ok(Exchange::Answered(prompt.label))
        }
        Action::Answer { text, effect } => {
            state.apply(effect);
            writer.write_line(channel, buffer, text)?;
            Ok(Exchange::Answered(prompt.label))
        }
    }
}
