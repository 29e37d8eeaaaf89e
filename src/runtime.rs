use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// How long the runner waits for input while no countdown is armed
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Unified event type consumed by the practice loop
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
    /// One countdown second elapsed for the session armed at `epoch`
    Tick { epoch: u64 },
    /// The event source is gone; nothing more will arrive
    Closed,
}

/// Source of input events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(SessionEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(SessionEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source for unit and headless tests
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// The session timer. Ticks are only produced while armed, and each tick is
/// stamped with the epoch of the session that armed it.
#[derive(Debug, Clone)]
pub struct Countdown {
    interval: Duration,
    next_tick: Option<Instant>,
    epoch: u64,
}

impl Countdown {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
            epoch: 0,
        }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }

    /// Start ticking for `epoch`. Re-arming for the same epoch keeps the schedule.
    pub fn arm(&mut self, epoch: u64) {
        if self.next_tick.is_some() && self.epoch == epoch {
            return;
        }
        self.epoch = epoch;
        self.next_tick = Some(Instant::now() + self.interval);
    }

    pub fn disarm(&mut self) {
        self.next_tick = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick
            .map(|next| next.saturating_duration_since(now))
    }

    /// Consume a due tick, scheduling the following one on the same cadence.
    fn fire(&mut self, now: Instant) -> Option<u64> {
        match self.next_tick {
            Some(next) if next <= now => {
                self.next_tick = Some(next + self.interval);
                Some(self.epoch)
            }
            _ => None,
        }
    }
}

/// Runner that advances the session one event/tick at a time
pub struct Runner<E: EventSource> {
    event_source: E,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E) -> Self {
        Self { event_source }
    }

    /// Blocks until the next input event or due countdown tick.
    pub fn step(&self, countdown: &mut Countdown) -> SessionEvent {
        loop {
            let now = Instant::now();
            if let Some(epoch) = countdown.fire(now) {
                return SessionEvent::Tick { epoch };
            }
            let wait = countdown.time_until_tick(now).unwrap_or(IDLE_POLL);

            match self.event_source.recv_timeout(wait) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return SessionEvent::Closed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_when_armed() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx));
        let mut countdown = Countdown::new(Duration::from_millis(1));
        countdown.arm(4);

        assert_eq!(runner.step(&mut countdown), SessionEvent::Tick { epoch: 4 });
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(SessionEvent::Resize).unwrap();
        let runner = Runner::new(TestEventSource::new(rx));
        let mut countdown = Countdown::new(Duration::from_millis(10));

        assert_eq!(runner.step(&mut countdown), SessionEvent::Resize);
    }

    #[test]
    fn disarmed_countdown_never_ticks() {
        let (tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx));
        let mut countdown = Countdown::new(Duration::from_millis(1));
        countdown.arm(0);
        countdown.disarm();

        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            let _ = tx.send(SessionEvent::Key(key));
        });

        assert_eq!(runner.step(&mut countdown), SessionEvent::Key(key));
    }

    #[test]
    fn closed_source_is_reported() {
        let (tx, rx) = mpsc::channel::<SessionEvent>();
        drop(tx);
        let runner = Runner::new(TestEventSource::new(rx));
        let mut countdown = Countdown::every_second();

        assert_eq!(runner.step(&mut countdown), SessionEvent::Closed);
    }

    #[test]
    fn rearming_same_epoch_keeps_schedule() {
        let mut countdown = Countdown::new(Duration::from_secs(60));
        countdown.arm(1);
        let first = countdown.next_tick;
        countdown.arm(1);
        assert_eq!(countdown.next_tick, first);

        countdown.arm(2);
        assert!(countdown.is_armed());
        assert_eq!(countdown.epoch, 2);
    }

    #[test]
    fn fire_keeps_cadence() {
        let mut countdown = Countdown::new(Duration::from_millis(100));
        countdown.arm(0);
        let scheduled = countdown.next_tick.unwrap();

        assert_eq!(countdown.fire(scheduled - Duration::from_millis(1)), None);
        assert_eq!(countdown.fire(scheduled), Some(0));
        assert_eq!(countdown.next_tick, Some(scheduled + Duration::from_millis(100)));
    }
}
