use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::session::Trainer;
use crate::store::Store;

/// Unified event type consumed by the trainer loop
#[derive(Clone, Debug)]
pub enum TrainerEvent {
    Key(KeyEvent),
    Resize,
    /// No input arrived before the wait ended
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait TrainerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<TrainerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // Windows reports releases too; only presses drive the trainer
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    if tx.send(TrainerEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(TrainerEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    log::error!("terminal event reader stopped: {}", err);
                    break;
                }
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

impl TrainerEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed event source for tests and headless driving
pub struct TestEventSource {
    rx: Receiver<TrainerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TrainerEvent>) -> Self {
        Self { rx }
    }
}

impl TrainerEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrainerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Waits for the next terminal event, waking up early when one of the
/// trainer's countdowns comes due.
pub struct Runner<E: TrainerEventSource> {
    event_source: E,
    idle: Duration,
}

impl<E: TrainerEventSource> Runner<E> {
    /// `idle` bounds the wait while no countdown is running.
    pub fn new(event_source: E, idle: Duration) -> Self {
        Self { event_source, idle }
    }

    /// How long a step blocks when the next countdown is `wake_in` away
    pub fn wait_for(&self, wake_in: Option<Duration>) -> Duration {
        wake_in.map_or(self.idle, |wake| wake.min(self.idle))
    }

    /// Blocks until an event arrives or `wake_in` elapses; Tick on timeout
    pub fn step(&self, wake_in: Option<Duration>) -> TrainerEvent {
        match self.event_source.recv_timeout(self.wait_for(wake_in)) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                TrainerEvent::Tick
            }
        }
    }

    /// Next event for `trainer`, timed against its running countdowns
    pub fn next<S: Store>(&self, trainer: &Trainer<S>) -> TrainerEvent {
        self.step(trainer.next_wake(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::user::User;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::path::Path;

    fn runner(rx: Receiver<TrainerEvent>) -> Runner<TestEventSource> {
        Runner::new(TestEventSource::new(rx), Duration::from_millis(200))
    }

    #[test]
    fn wait_is_bounded_by_idle_interval() {
        let (_tx, rx) = mpsc::channel();
        let runner = runner(rx);
        assert_eq!(runner.wait_for(None), Duration::from_millis(200));
        assert_eq!(
            runner.wait_for(Some(Duration::from_millis(30))),
            Duration::from_millis(30)
        );
        assert_eq!(
            runner.wait_for(Some(Duration::from_secs(9))),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let runner = runner(rx);
        let started = Instant::now();
        assert!(matches!(
            runner.step(Some(Duration::from_millis(1))),
            TrainerEvent::Tick
        ));
        assert!(started.elapsed() < Duration::from_millis(200));
    }

    #[test]
    fn step_returns_tick_when_sender_is_gone() {
        let (tx, rx) = mpsc::channel::<TrainerEvent>();
        drop(tx);
        assert!(matches!(runner(rx).step(None), TrainerEvent::Tick));
    }

    #[test]
    fn step_passes_through_events_in_order() {
        let (tx, rx) = mpsc::channel();
        tx.send(TrainerEvent::Resize).unwrap();
        tx.send(TrainerEvent::Key(KeyEvent::new(
            KeyCode::Enter,
            KeyModifiers::NONE,
        )))
        .unwrap();
        let runner = runner(rx);

        assert!(matches!(runner.step(None), TrainerEvent::Resize));
        match runner.step(None) {
            TrainerEvent::Key(key) => assert_eq!(key.code, KeyCode::Enter),
            _ => panic!("expected Key event"),
        }
    }

    #[test]
    fn next_wakes_when_the_response_timer_is_due() {
        let mut trainer = Trainer::open(SqliteStore::open_in_memory().unwrap(), None).unwrap();
        trainer.apply_settings(User {
            char_based_timer: true,
            char_timer_value: 5,
            ..User::default()
        });
        trainer.import_list(Path::new("short.txt"), "abcd").unwrap();
        trainer.generate_sentence();

        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx), Duration::from_secs(5));
        let started = Instant::now();
        assert!(matches!(runner.next(&trainer), TrainerEvent::Tick));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(trainer.on_tick(Instant::now()));
        assert_eq!(trainer.view().prompt, crate::session::PROMPT_TYPE);
    }
}
