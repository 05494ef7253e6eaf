use std::sync::mpsc::Sender;

use crossterm::event::KeyEvent;
use tracing::warn;

use crate::clock::ChannelClock;
use crate::display::ViewModel;
use crate::input::{action_for_key, Action, InputContext};
use crate::passages::PassageBook;
use crate::runtime::ChallengeEvent;
use crate::session::{SessionEvent, TypingSession};

pub type ChallengeSession = TypingSession<ChannelClock, ViewModel>;

#[derive(Debug)]
pub struct App {
    pub session: ChallengeSession,
    pub should_quit: bool,
}

impl App {
    /// `events` is the stream the app itself consumes; the session clock ticks into it.
    pub fn new(passages: PassageBook, events: Sender<ChallengeEvent>) -> Self {
        Self {
            session: TypingSession::new(passages, ChannelClock::new(events), ViewModel::default()),
            should_quit: false,
        }
    }

    pub fn view(&self) -> &ViewModel {
        self.session.display()
    }

    /// Applies one event. Returns whether the screen needs redrawing.
    pub fn handle_event(&mut self, event: ChallengeEvent) -> bool {
        match event {
            ChallengeEvent::Tick(epoch) => {
                if !self.session.clock().accepts(epoch) {
                    return false;
                }
                self.apply(SessionEvent::Tick);
                true
            }
            ChallengeEvent::Resize => true,
            ChallengeEvent::Key(key) => self.handle_key(key),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctx = InputContext {
            cursor: self.session.cursor_pos(),
            typed_len: self.session.typed_len(),
            finished: self.session.is_finished(),
        };

        match action_for_key(key, ctx) {
            Some(Action::Quit) => {
                self.should_quit = true;
                false
            }
            Some(Action::Session(event)) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, event: SessionEvent) {
        if let Err(err) = self.session.dispatch(event) {
            warn!(?event, %err, "event rejected");
        }
    }
}
