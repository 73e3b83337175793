use std::time::{Duration, Instant};

/// A one-shot countdown polled from the event loop.
///
/// Starting a running countdown restarts it, and stopping is always allowed.
/// An expired countdown fires exactly once.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    deadline: Option<Instant>,
    duration: Duration,
}

impl Countdown {
    pub fn start(&mut self, now: Instant, duration: Duration) {
        self.duration = duration;
        self.deadline = Some(now + duration);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Length of the most recent start
    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns true, and stops, if the deadline has passed by `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_countdown_is_idle() {
        let mut countdown = Countdown::default();
        assert!(!countdown.is_running());
        assert!(!countdown.fire(Instant::now()));
        assert_eq!(countdown.remaining(Instant::now()), None);
    }

    #[test]
    fn fires_once_after_deadline() {
        let now = Instant::now();
        let mut countdown = Countdown::default();
        countdown.start(now, Duration::from_millis(100));

        assert!(!countdown.fire(now + Duration::from_millis(99)));
        assert!(countdown.fire(now + Duration::from_millis(100)));
        assert!(!countdown.fire(now + Duration::from_millis(500)));
        assert!(!countdown.is_running());
    }

    #[test]
    fn restart_replaces_previous_deadline() {
        let now = Instant::now();
        let mut countdown = Countdown::default();
        countdown.start(now, Duration::from_millis(100));
        countdown.start(now + Duration::from_millis(50), Duration::from_millis(100));

        assert!(!countdown.fire(now + Duration::from_millis(120)));
        assert!(countdown.fire(now + Duration::from_millis(150)));
        assert_eq!(countdown.duration(), Duration::from_millis(100));
    }

    #[test]
    fn stop_is_idempotent() {
        let now = Instant::now();
        let mut countdown = Countdown::default();
        countdown.stop();
        countdown.start(now, Duration::from_secs(1));
        countdown.stop();
        countdown.stop();
        assert!(!countdown.fire(now + Duration::from_secs(5)));
    }

    #[test]
    fn remaining_saturates_at_zero() {
        let now = Instant::now();
        let mut countdown = Countdown::default();
        countdown.start(now, Duration::from_secs(2));
        assert_eq!(
            countdown.remaining(now + Duration::from_secs(1)),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            countdown.remaining(now + Duration::from_secs(3)),
            Some(Duration::ZERO)
        );
    }
}
