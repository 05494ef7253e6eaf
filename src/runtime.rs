use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChallengeEvent {
    Key(KeyEvent),
    Resize,
    /// One second of the session timer, tagged with the clock epoch that produced it.
    Tick(u64),
}

/// Source of app events (keyboard, resize, timer ticks)
pub trait ChallengeEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<ChallengeEvent, RecvTimeoutError>;

    /// Handle for other producers, such as the session clock, to feed the same stream.
    fn sender(&self) -> Sender<ChallengeEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<ChallengeEvent>,
    rx: Receiver<ChallengeEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let key_tx = tx.clone();

        std::thread::spawn(move || loop {
            let sent = match event::read() {
                // Windows reports releases too; only presses type
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    key_tx.send(ChallengeEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => key_tx.send(ChallengeEvent::Resize),
                Ok(_) => Ok(()),
                Err(err) => {
                    tracing::error!(%err, "terminal event stream failed");
                    break;
                }
            };
            if sent.is_err() {
                break;
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ChallengeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<ChallengeEvent> {
        self.tx.clone()
    }
}

/// Event source fed by hand, for tests and scripted runs
pub struct TestEventSource {
    tx: Sender<ChallengeEvent>,
    rx: Receiver<ChallengeEvent>,
}

impl TestEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for TestEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChallengeEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ChallengeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<ChallengeEvent> {
        self.tx.clone()
    }
}

/// Outcome of one [`Runner::step`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Event(ChallengeEvent),
    /// Nothing arrived within the poll interval.
    Idle,
}

/// Runner that advances the application one event at a time
pub struct Runner<E: ChallengeEventSource> {
    event_source: E,
    poll_interval: Duration,
}

impl<E: ChallengeEventSource> Runner<E> {
    pub fn new(event_source: E, poll_interval: Duration) -> Self {
        Self {
            event_source,
            poll_interval,
        }
    }

    pub fn sender(&self) -> Sender<ChallengeEvent> {
        self.event_source.sender()
    }

    /// Blocks up to the poll interval and returns the next event.
    ///
    /// The runner keeps a sender of its own, so the stream never disconnects
    /// while the runner is alive.
    pub fn step(&self) -> Step {
        match self.event_source.recv_timeout(self.poll_interval) {
            Ok(ev) => Step::Event(ev),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Step::Idle,
        }
    }
}
