use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::runtime::ChallengeEvent;

/// Interval at which a running session's timer ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000);

/// Repeating timer the session starts on the first keystroke and stops when it
/// finishes or resets.
pub trait Clock {
    fn start(&mut self, interval: Duration);
    /// Stops delivering ticks. Stopping a stopped clock is a no-op.
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

/// Production clock: a ticker thread feeding [`ChallengeEvent::Tick`] into the
/// app's event channel.
///
/// Every `start` opens a new epoch and every tick carries the epoch it was
/// produced in. Ticks still sitting in the channel after `stop` are filtered
/// out by [`ChannelClock::accepts`].
#[derive(Debug)]
pub struct ChannelClock {
    tx: Sender<ChallengeEvent>,
    epoch: u64,
    running: Option<Arc<AtomicBool>>,
}

impl ChannelClock {
    pub fn new(tx: Sender<ChallengeEvent>) -> Self {
        Self {
            tx,
            epoch: 0,
            running: None,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether a tick from `epoch` belongs to the run in progress.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.running.is_some() && epoch == self.epoch
    }
}

impl Clock for ChannelClock {
    fn start(&mut self, interval: Duration) {
        self.stop();
        self.epoch += 1;

        let epoch = self.epoch;
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let tx = self.tx.clone();

        thread::spawn(move || {
            let started = Instant::now();
            let mut ticks: u32 = 0;
            loop {
                ticks += 1;
                // deadlines are absolute so sleep overshoot does not accumulate
                let deadline = started + interval * ticks;
                thread::sleep(deadline.saturating_duration_since(Instant::now()));

                if !flag.load(Ordering::Acquire) {
                    break;
                }
                if tx.send(ChallengeEvent::Tick(epoch)).is_err() {
                    break;
                }
            }
        });

        tracing::trace!(epoch, ?interval, "clock started");
        self.running = Some(running);
    }

    fn stop(&mut self) {
        if let Some(flag) = self.running.take() {
            flag.store(false, Ordering::Release);
            tracing::trace!(epoch = self.epoch, "clock stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }
}

impl Drop for ChannelClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clock for tests and scripted runs: never ticks on its own, only records how
/// it was driven. Tests deliver ticks by dispatching them to the session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ManualClock {
    running: bool,
    pub starts: Vec<Duration>,
    pub stops: usize,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for ManualClock {
    fn start(&mut self, interval: Duration) {
        self.running = true;
        self.starts.push(interval);
    }

    fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
