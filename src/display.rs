use crate::scoring::SessionResults;
use crate::util::format_elapsed;

/// Sink the session reports its state to. The session never reads back from it.
pub trait ChallengeDisplay {
    fn show_sample_text(&mut self, text: &str);
    /// Re-renders the input buffer, also used to undo a rejected keystroke.
    fn show_typed_text(&mut self, text: &str, cursor: usize);
    fn show_typed_stats(&mut self, words_typed: usize);
    /// `formatted` is `M:SS`.
    fn show_elapsed_time(&mut self, formatted: &str);
    fn show_results(&mut self, results: &SessionResults);
    /// Back to the state of a fresh round.
    fn reset_view(&mut self);
}

/// Everything the terminal UI draws, kept up to date by the session.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub sample_text: String,
    pub typed_text: String,
    pub cursor: usize,
    pub words_typed: usize,
    pub elapsed: String,
    pub results: Option<SessionResults>,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            sample_text: String::new(),
            typed_text: String::new(),
            cursor: 0,
            words_typed: 0,
            elapsed: format_elapsed(0),
            results: None,
        }
    }
}

impl ChallengeDisplay for ViewModel {
    fn show_sample_text(&mut self, text: &str) {
        self.sample_text = text.to_string();
    }

    fn show_typed_text(&mut self, text: &str, cursor: usize) {
        self.typed_text = text.to_string();
        self.cursor = cursor;
    }

    fn show_typed_stats(&mut self, words_typed: usize) {
        self.words_typed = words_typed;
    }

    fn show_elapsed_time(&mut self, formatted: &str) {
        self.elapsed = formatted.to_string();
    }

    fn show_results(&mut self, results: &SessionResults) {
        self.results = Some(results.clone());
    }

    fn reset_view(&mut self) {
        *self = Self::default();
    }
}

/// One call the session made on its display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    SampleText(String),
    TypedText { text: String, cursor: usize },
    TypedStats(usize),
    ElapsedTime(String),
    Results(SessionResults),
    ResetView,
}

/// Display for scripted runs: records every update in order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingDisplay {
    pub updates: Vec<DisplayUpdate>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&DisplayUpdate> {
        self.updates.last()
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }
}

impl ChallengeDisplay for RecordingDisplay {
    fn show_sample_text(&mut self, text: &str) {
        self.updates.push(DisplayUpdate::SampleText(text.to_string()));
    }

    fn show_typed_text(&mut self, text: &str, cursor: usize) {
        self.updates.push(DisplayUpdate::TypedText {
            text: text.to_string(),
            cursor,
        });
    }

    fn show_typed_stats(&mut self, words_typed: usize) {
        self.updates.push(DisplayUpdate::TypedStats(words_typed));
    }

    fn show_elapsed_time(&mut self, formatted: &str) {
        self.updates
            .push(DisplayUpdate::ElapsedTime(formatted.to_string()));
    }

    fn show_results(&mut self, results: &SessionResults) {
        self.updates.push(DisplayUpdate::Results(results.clone()));
    }

    fn reset_view(&mut self) {
        self.updates.push(DisplayUpdate::ResetView);
    }
}
