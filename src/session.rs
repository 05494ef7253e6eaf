use rand::Rng;
use tracing::{debug, info, trace};

use crate::clock::{Clock, TICK_INTERVAL};
use crate::display::ChallengeDisplay;
use crate::error::SessionError;
use crate::passages::PassageBook;
use crate::scoring::{count_words, score, SessionResults};
use crate::util::format_elapsed;

/// Everything that can happen to a session, delivered one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    TypeCharacter(char),
    DeleteCharacter,
    MoveCursor(usize),
    RequestReset,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Timer not started, nothing typed.
    Idle,
    Typing,
    /// Terminal: results are frozen until the next reset.
    Finished,
}

/// What became of a typed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keystroke {
    Accepted,
    /// A space next to another space, or at the start of the input.
    Rejected,
}

/// One round of the typing challenge: the passage, the input buffer, the caret
/// and the timer, reporting every change to its display.
#[derive(Debug)]
pub struct TypingSession<C: Clock, D: ChallengeDisplay> {
    passages: PassageBook,
    sample: Vec<char>,
    sample_text: String,
    typed: Vec<char>,
    cursor_pos: usize,
    blank_space_adjacent: bool,
    timer_running: bool,
    elapsed_seconds: u64,
    words_typed: usize,
    results: Option<SessionResults>,
    clock: C,
    display: D,
}

impl<C: Clock, D: ChallengeDisplay> TypingSession<C, D> {
    /// Starts a session on a passage drawn at random from `passages`.
    pub fn new(passages: PassageBook, clock: C, display: D) -> Self {
        let mut session = Self {
            passages,
            sample: Vec::new(),
            sample_text: String::new(),
            typed: Vec::new(),
            cursor_pos: 0,
            blank_space_adjacent: true,
            timer_running: false,
            elapsed_seconds: 0,
            words_typed: 0,
            results: None,
            clock,
            display,
        };
        session.reset();
        session
    }

    pub fn reset(&mut self) {
        self.reset_with_rng(&mut rand::thread_rng());
    }

    pub fn reset_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let passage = self.passages.choose(rng).to_string();
        self.reset_to(passage);
    }

    /// Resets onto a given passage instead of drawing one.
    pub fn reset_to(&mut self, sample_text: impl Into<String>) {
        self.clock.stop();

        self.sample_text = sample_text.into();
        self.sample = self.sample_text.chars().collect();
        self.typed.clear();
        self.cursor_pos = 0;
        self.blank_space_adjacent = true;
        self.timer_running = false;
        self.elapsed_seconds = 0;
        self.words_typed = 0;
        self.results = None;

        self.display.reset_view();
        self.display.show_sample_text(&self.sample_text);
        info!(
            pack = self.passages.name(),
            chars = self.sample.len(),
            "new round"
        );
    }

    /// Swaps the candidate passages and starts a new round from them.
    pub fn replace_passages(&mut self, passages: PassageBook) {
        self.passages = passages;
        self.reset();
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<(), SessionError> {
        match event {
            SessionEvent::TypeCharacter(c) => self.type_character(c).map(|_| ()),
            SessionEvent::DeleteCharacter => self.delete_character(),
            SessionEvent::MoveCursor(pos) => self.move_cursor(pos),
            SessionEvent::RequestReset => {
                self.reset();
                Ok(())
            }
            SessionEvent::Tick => {
                self.on_clock_tick();
                Ok(())
            }
        }
    }

    pub fn type_character(&mut self, c: char) -> Result<Keystroke, SessionError> {
        self.ensure_not_finished()?;
        if c.is_control() {
            return Err(SessionError::InvalidCharacter(c));
        }

        if !self.timer_running && c != ' ' {
            self.timer_running = true;
            self.elapsed_seconds = 0;
            self.clock.start(TICK_INTERVAL);
            debug!("timer started");
        }

        if self.blank_space_adjacent && c == ' ' {
            trace!(cursor = self.cursor_pos, "space rejected");
            self.show_buffer();
            return Ok(Keystroke::Rejected);
        }

        self.typed.insert(self.cursor_pos, c);
        self.cursor_pos += 1;
        self.refresh_after_edit();

        if self.typed.len() == self.sample.len() {
            self.finish();
        }
        Ok(Keystroke::Accepted)
    }

    /// Backspace: removes the character before the caret. Does nothing at the start.
    ///
    /// The timer keeps running even when the buffer is emptied.
    pub fn delete_character(&mut self) -> Result<(), SessionError> {
        self.ensure_not_finished()?;
        if self.cursor_pos == 0 {
            return Ok(());
        }

        self.typed.remove(self.cursor_pos - 1);
        self.cursor_pos -= 1;
        self.refresh_after_edit();
        Ok(())
    }

    pub fn move_cursor(&mut self, position: usize) -> Result<(), SessionError> {
        self.ensure_not_finished()?;
        if position > self.typed.len() {
            return Err(SessionError::OutOfRange {
                position,
                length: self.typed.len(),
            });
        }

        self.cursor_pos = position;
        self.blank_space_adjacent = blank_space_adjacent(&self.typed, position);
        self.show_buffer();
        Ok(())
    }

    /// Advances the timer by one second. Ticks arriving while the timer is not
    /// running, or after the session finished, are dropped.
    pub fn on_clock_tick(&mut self) {
        if !self.timer_running || self.results.is_some() {
            debug!(phase = ?self.phase(), "ignoring stray tick");
            return;
        }

        self.elapsed_seconds += 1;
        self.display
            .show_elapsed_time(&format_elapsed(self.elapsed_seconds));
    }

    fn ensure_not_finished(&self) -> Result<(), SessionError> {
        if self.results.is_some() {
            Err(SessionError::InvalidState)
        } else {
            Ok(())
        }
    }

    fn refresh_after_edit(&mut self) {
        if self.typed.is_empty() {
            self.cursor_pos = 0;
            self.words_typed = 0;
            self.blank_space_adjacent = true;
        } else {
            self.words_typed = count_words(&self.typed);
            self.blank_space_adjacent = blank_space_adjacent(&self.typed, self.cursor_pos);
        }
        self.show_buffer();
        self.display.show_typed_stats(self.words_typed);
    }

    fn show_buffer(&mut self) {
        let text: String = self.typed.iter().collect();
        self.display.show_typed_text(&text, self.cursor_pos);
    }

    fn finish(&mut self) {
        self.clock.stop();
        let results = score(&self.sample, &self.typed, self.elapsed_seconds);
        info!(
            wpm = results.rounded_wpm(),
            error_percentage = results.rounded_error_percentage(),
            elapsed_seconds = self.elapsed_seconds,
            "round finished"
        );
        self.display.show_results(&results);
        self.results = Some(results);
    }

    pub fn phase(&self) -> SessionPhase {
        if self.results.is_some() {
            SessionPhase::Finished
        } else if self.timer_running {
            SessionPhase::Typing
        } else {
            SessionPhase::Idle
        }
    }

    pub fn sample_text(&self) -> &str {
        &self.sample_text
    }

    pub fn typed_text(&self) -> String {
        self.typed.iter().collect()
    }

    /// Length of the input buffer in characters.
    pub fn typed_len(&self) -> usize {
        self.typed.len()
    }

    pub fn cursor_pos(&self) -> usize {
        self.cursor_pos
    }

    pub fn blank_space_adjacent(&self) -> bool {
        self.blank_space_adjacent
    }

    pub fn timer_running(&self) -> bool {
        self.timer_running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn words_typed(&self) -> usize {
        self.words_typed
    }

    pub fn is_finished(&self) -> bool {
        self.results.is_some()
    }

    pub fn results(&self) -> Option<&SessionResults> {
        self.results.as_ref()
    }

    pub fn passages(&self) -> &PassageBook {
        &self.passages
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn display(&self) -> &D {
        &self.display
    }
}

/// True at the start of the buffer or when a space sits right before or right
/// after `pos`.
pub fn blank_space_adjacent(typed: &[char], pos: usize) -> bool {
    if pos == 0 {
        return true;
    }
    typed.get(pos - 1) == Some(&' ') || typed.get(pos) == Some(&' ')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::display::{DisplayUpdate, RecordingDisplay};
    use assert_matches::assert_matches;

    fn session_for(sample: &str) -> TypingSession<ManualClock, RecordingDisplay> {
        let book = PassageBook::single(sample).unwrap();
        TypingSession::new(book, ManualClock::new(), RecordingDisplay::new())
    }

    fn type_str(session: &mut TypingSession<ManualClock, RecordingDisplay>, s: &str) {
        for c in s.chars() {
            session.type_character(c).unwrap();
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session_for("hello world");

        assert_eq!(session.sample_text(), "hello world");
        assert_eq!(session.typed_text(), "");
        assert_eq!(session.cursor_pos(), 0);
        assert!(session.blank_space_adjacent());
        assert!(!session.timer_running());
        assert_eq!(session.elapsed_seconds(), 0);
        assert!(!session.is_finished());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(
            session.display().updates,
            vec![
                DisplayUpdate::ResetView,
                DisplayUpdate::SampleText("hello world".into())
            ]
        );
    }

    #[test]
    fn test_first_letter_starts_timer() {
        let mut session = session_for("hello");

        assert_eq!(session.type_character('h'), Ok(Keystroke::Accepted));

        assert!(session.timer_running());
        assert!(session.clock().is_running());
        assert_eq!(session.clock().starts, vec![TICK_INTERVAL]);
        assert_eq!(session.phase(), SessionPhase::Typing);
    }

    #[test]
    fn test_leading_space_rejected_and_timer_not_started() {
        let mut session = session_for("hello");

        assert_eq!(session.type_character(' '), Ok(Keystroke::Rejected));

        assert_eq!(session.typed_text(), "");
        assert!(!session.timer_running());
        assert!(session.clock().starts.is_empty());
        assert_eq!(
            session.display().last(),
            Some(&DisplayUpdate::TypedText {
                text: String::new(),
                cursor: 0
            })
        );
    }

    #[test]
    fn test_double_space_rejected() {
        let mut session = session_for("ab cd ef");
        type_str(&mut session, "ab ");

        assert_eq!(session.type_character(' '), Ok(Keystroke::Rejected));
        assert_eq!(session.typed_text(), "ab ");
        assert_eq!(session.cursor_pos(), 3);
    }

    #[test]
    fn test_space_rejected_before_existing_space() {
        let mut session = session_for("abc def ghi");
        type_str(&mut session, "ab cd");
        session.move_cursor(2).unwrap();

        assert_eq!(session.type_character(' '), Ok(Keystroke::Rejected));
        assert_eq!(session.typed_text(), "ab cd");
    }

    #[test]
    fn test_insert_in_the_middle() {
        let mut session = session_for("abcdef");
        type_str(&mut session, "acd");
        session.move_cursor(1).unwrap();

        session.type_character('b').unwrap();

        assert_eq!(session.typed_text(), "abcd");
        assert_eq!(session.cursor_pos(), 2);
    }

    #[test]
    fn test_words_typed_updates() {
        let mut session = session_for("one two three");
        type_str(&mut session, "one tw");

        assert_eq!(session.words_typed(), 2);
        assert_eq!(session.display().last(), Some(&DisplayUpdate::TypedStats(2)));
    }

    #[test]
    fn test_finish_on_matching_length() {
        let mut session = session_for("Hello World");
        type_str(&mut session, "Hello Worl");
        for _ in 0..30 {
            session.on_clock_tick();
        }
        assert!(!session.is_finished());

        session.type_character('d').unwrap();

        assert!(session.is_finished());
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert!(!session.clock().is_running());
        let results = session.results().unwrap();
        assert_eq!(results.words_typed, 2);
        assert_eq!(results.wpm, 4.0);
        assert_eq!(results.error_count, 0);
        assert_matches!(session.display().last(), Some(DisplayUpdate::Results(_)));
    }

    #[test]
    fn test_finish_scores_errors() {
        let mut session = session_for("cat");
        type_str(&mut session, "cot");

        let results = session.results().unwrap();
        assert_eq!(results.error_count, 1);
        assert_eq!(results.rounded_error_percentage(), 33.33);
    }

    #[test]
    fn test_finish_without_ticks_reports_zero_wpm() {
        let mut session = session_for("hi");
        type_str(&mut session, "hi");

        assert_eq!(session.results().unwrap().wpm, 0.0);
    }

    #[test]
    fn test_operations_after_finish_fail_without_mutation() {
        let mut session = session_for("ab");
        type_str(&mut session, "ab");
        let before = session.typed_text();

        assert_eq!(session.type_character('c'), Err(SessionError::InvalidState));
        assert_eq!(session.delete_character(), Err(SessionError::InvalidState));
        assert_eq!(session.move_cursor(0), Err(SessionError::InvalidState));

        assert_eq!(session.typed_text(), before);
        assert_eq!(session.cursor_pos(), 2);
    }

    #[test]
    fn test_control_characters_rejected() {
        let mut session = session_for("ab");

        assert_eq!(
            session.type_character('\n'),
            Err(SessionError::InvalidCharacter('\n'))
        );
        assert_eq!(session.typed_len(), 0);
        assert!(!session.timer_running());
    }

    #[test]
    fn test_delete_character() {
        let mut session = session_for("abcdef");
        type_str(&mut session, "abc");

        session.delete_character().unwrap();

        assert_eq!(session.typed_text(), "ab");
        assert_eq!(session.cursor_pos(), 2);
    }

    #[test]
    fn test_delete_before_caret_in_the_middle() {
        let mut session = session_for("abcdef");
        type_str(&mut session, "abxc");
        session.move_cursor(3).unwrap();

        session.delete_character().unwrap();

        assert_eq!(session.typed_text(), "abc");
        assert_eq!(session.cursor_pos(), 2);
    }

    #[test]
    fn test_delete_at_start_is_noop() {
        let mut session = session_for("abc");
        type_str(&mut session, "ab");
        session.move_cursor(0).unwrap();

        session.delete_character().unwrap();

        assert_eq!(session.typed_text(), "ab");
        assert_eq!(session.cursor_pos(), 0);
    }

    #[test]
    fn test_delete_to_empty_keeps_timer_running() {
        let mut session = session_for("abc def");
        type_str(&mut session, "ab c");
        session.on_clock_tick();

        for _ in 0..4 {
            session.delete_character().unwrap();
        }

        assert_eq!(session.typed_text(), "");
        assert_eq!(session.cursor_pos(), 0);
        assert_eq!(session.words_typed(), 0);
        assert!(session.blank_space_adjacent());
        assert!(session.timer_running());
        assert!(session.clock().is_running());
        assert_eq!(session.elapsed_seconds(), 1);

        session.on_clock_tick();
        assert_eq!(session.elapsed_seconds(), 2);
    }

    #[test]
    fn test_delete_recomputes_blank_space() {
        let mut session = session_for("ab cdef");
        type_str(&mut session, "ab c");
        assert!(!session.blank_space_adjacent());

        session.delete_character().unwrap();

        assert!(session.blank_space_adjacent());
        assert_eq!(session.words_typed(), 1);
    }

    #[test]
    fn test_move_cursor_recomputes_blank_space() {
        let mut session = session_for("ab cd ef");
        type_str(&mut session, "ab cd");

        session.move_cursor(2).unwrap();
        assert!(session.blank_space_adjacent());

        session.move_cursor(1).unwrap();
        assert!(!session.blank_space_adjacent());

        session.move_cursor(0).unwrap();
        assert!(session.blank_space_adjacent());

        session.move_cursor(3).unwrap();
        assert!(session.blank_space_adjacent());

        session.move_cursor(5).unwrap();
        assert!(!session.blank_space_adjacent());
    }

    #[test]
    fn test_move_cursor_out_of_range() {
        let mut session = session_for("abcdef");
        type_str(&mut session, "abc");

        assert_eq!(
            session.move_cursor(4),
            Err(SessionError::OutOfRange {
                position: 4,
                length: 3
            })
        );
        assert_eq!(session.cursor_pos(), 3);
    }

    #[test]
    fn test_move_cursor_updates_display() {
        let mut session = session_for("abcdef");
        type_str(&mut session, "abc");

        session.move_cursor(1).unwrap();

        assert_eq!(
            session.display().last(),
            Some(&DisplayUpdate::TypedText {
                text: "abc".into(),
                cursor: 1
            })
        );
    }

    #[test]
    fn test_tick_formats_elapsed_time() {
        let mut session = session_for("a long enough passage");
        session.type_character('a').unwrap();

        for _ in 0..65 {
            session.on_clock_tick();
        }

        assert_eq!(session.elapsed_seconds(), 65);
        assert_eq!(
            session.display().last(),
            Some(&DisplayUpdate::ElapsedTime("1:05".into()))
        );
    }

    #[test]
    fn test_tick_before_start_is_ignored() {
        let mut session = session_for("abc");

        session.on_clock_tick();

        assert_eq!(session.elapsed_seconds(), 0);
    }

    #[test]
    fn test_tick_after_finish_is_ignored() {
        let mut session = session_for("ab");
        session.type_character('a').unwrap();
        session.on_clock_tick();
        session.type_character('b').unwrap();

        session.on_clock_tick();

        assert_eq!(session.elapsed_seconds(), 1);
        assert_eq!(session.results().unwrap().elapsed_seconds, 1);
    }

    #[test]
    fn test_reset_restores_defaults_from_any_state() {
        let mut session = session_for("ab cd");
        type_str(&mut session, "ab c");
        session.on_clock_tick();
        session.move_cursor(1).unwrap();

        session.reset();

        assert_eq!(session.typed_text(), "");
        assert_eq!(session.cursor_pos(), 0);
        assert!(session.blank_space_adjacent());
        assert!(!session.timer_running());
        assert_eq!(session.elapsed_seconds(), 0);
        assert!(!session.is_finished());
        assert!(!session.clock().is_running());
        assert_eq!(session.clock().stops, 1);

        type_str(&mut session, "ab cd");
        assert!(session.is_finished());
        session.reset();
        assert!(!session.is_finished());
        assert!(session.results().is_none());
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_reset_notifies_display() {
        let mut session = session_for("abc");
        session.type_character('a').unwrap();

        session.reset_to("xyz");

        let updates = &session.display().updates;
        assert_eq!(
            &updates[updates.len() - 2..],
            &[
                DisplayUpdate::ResetView,
                DisplayUpdate::SampleText("xyz".into())
            ]
        );
        assert_eq!(session.sample_text(), "xyz");
    }

    #[test]
    fn test_reset_picks_from_the_book() {
        let book = PassageBook::new("two", vec!["first".into(), "second".into()]).unwrap();
        let mut session = TypingSession::new(book, ManualClock::new(), RecordingDisplay::new());

        for _ in 0..20 {
            session.reset();
            assert!(["first", "second"].contains(&session.sample_text()));
        }
    }

    #[test]
    fn test_replace_passages() {
        let mut session = session_for("abc");

        session.replace_passages(PassageBook::single("fresh").unwrap());

        assert_eq!(session.sample_text(), "fresh");
        assert_eq!(session.passages().name(), "custom");
    }

    #[test]
    fn test_dispatch_routes_events() {
        let mut session = session_for("ab cd");

        session.dispatch(SessionEvent::TypeCharacter('a')).unwrap();
        session.dispatch(SessionEvent::TypeCharacter('x')).unwrap();
        session.dispatch(SessionEvent::DeleteCharacter).unwrap();
        session.dispatch(SessionEvent::Tick).unwrap();
        session.dispatch(SessionEvent::MoveCursor(0)).unwrap();

        assert_eq!(session.typed_text(), "a");
        assert_eq!(session.cursor_pos(), 0);
        assert_eq!(session.elapsed_seconds(), 1);

        assert_eq!(
            session.dispatch(SessionEvent::MoveCursor(9)),
            Err(SessionError::OutOfRange {
                position: 9,
                length: 1
            })
        );

        session.dispatch(SessionEvent::RequestReset).unwrap();
        assert_eq!(session.typed_text(), "");
        assert!(!session.timer_running());
    }

    #[test]
    fn test_unicode_positions_are_characters() {
        let mut session = session_for("café au lait");
        type_str(&mut session, "café");

        assert_eq!(session.cursor_pos(), 4);
        session.move_cursor(4).unwrap();
        session.type_character(' ').unwrap();
        assert_eq!(session.typed_text(), "café ");
    }

    #[test]
    fn test_blank_space_adjacent_rule() {
        let typed: Vec<char> = "ab cd".chars().collect();

        assert!(blank_space_adjacent(&typed, 0));
        assert!(!blank_space_adjacent(&typed, 1));
        assert!(blank_space_adjacent(&typed, 2));
        assert!(blank_space_adjacent(&typed, 3));
        assert!(!blank_space_adjacent(&typed, 4));
        assert!(!blank_space_adjacent(&typed, 5));
        assert!(blank_space_adjacent(&[], 0));
    }
}
