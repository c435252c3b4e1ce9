use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// What answering a prompt does to the session's automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Leaves the review/edit latch open for the next "Press S"
    ClearReviewEdit,
    /// Battery type selection: a clean configuration run is starting
    BeginRun,
    /// Trickle settings: re-enter the menu after the next status line
    ArmReconfigure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// "Press S to Review/Edit": press `s` once per session
    ReviewEdit,
    /// Informational line, swallowed without a reply
    Skip,
    /// Type `text` followed by a carriage return
    Answer { text: &'static str, effect: Effect },
}

#[derive(Debug)]
pub struct Prompt {
    pub label: &'static str,
    pub pattern: Regex,
    pub action: Action,
}

impl Prompt {
    fn new(label: &'static str, pattern: &str, action: Action) -> Self {
        let pattern = Regex::new(&format!("(?-u){}", pattern)).expect("valid prompt regex");
        Self { label, pattern, action }
    }

    fn answer(label: &'static str, pattern: &str, text: &'static str, effect: Effect) -> Self {
        Self::new(label, pattern, Action::Answer { text, effect })
    }
}

/// Known console prompts, checked in order. The first one found anywhere in
/// the buffer wins, so earlier entries shadow later ones.
pub static PROMPTS: Lazy<Vec<Prompt>> = Lazy::new(|| {
    use Effect::*;

    vec![
        Prompt::new("Pressed S", r"Press S to Review/Edit Charge settings\r\n", Action::ReviewEdit),
        Prompt::new("Jumpers", r"Jumpers: .*\r\n", Action::Skip),
        Prompt::new("Because jumper", r"Because jumper is.*\r\n", Action::Skip),
        // LiFePO4
        Prompt::answer("Battery", r"Battery: .*>: ", "4", BeginRun),
        Prompt::answer("Battery", r"5-Other: .*>: ", "4", BeginRun),
        Prompt::answer("No reset to default", r"Reset to default .*>\? ", "n", ClearReviewEdit),
        Prompt::answer("Max charge voltage", r"Max charge voltage .*>: ", "14.5", ClearReviewEdit),
        Prompt::answer("Max charge current", r"Max charge current .*>: ", "10.0", ClearReviewEdit),
        Prompt::answer("Min charge current", r"Min charge current .*>: ", "0.25", ClearReviewEdit),
        Prompt::answer("Recharge voltage", r"Recharge voltage .*>: ", "13.68", ClearReviewEdit),
        Prompt::answer("Charge minutes", r"Max charge \(min.*>: ", "1500", ClearReviewEdit),
        Prompt::answer("Retry minutes", r"Retry after .*>: ", "30", ClearReviewEdit),
        Prompt::answer("Min supply voltage", r"Min supply voltage .*>: ", "13", ClearReviewEdit),
        Prompt::answer("Trickle current (will reconfigure)", r"Trickle current .*>: ", "0", ArmReconfigure),
        Prompt::answer("Trickle voltage (will reconfigure)", r"Trickle voltage .*>: ", "14", ArmReconfigure),
        Prompt::answer("Min charge temp", r"Lowest Charge Temp .*>: ", "35", ClearReviewEdit),
        Prompt::answer("Max charge temp", r"Highest Charge Temp .*>: ", "110", ClearReviewEdit),
        Prompt::answer("Temperature voltage adjust", r"Use temp to adjust .*>\? ", "n", ClearReviewEdit),
    ]
});
