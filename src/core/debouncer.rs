/*
 * A trailing-edge debouncer driven by an explicit clock. Each `call` replaces the
 * pending value and restarts the delay; `poll` hands the value out once the delay has
 * elapsed since the most recent call. Nothing here spawns threads or reads the system
 * clock, so the owner decides when time advances.
 */
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    /* When the pending value becomes due, if any. */
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn call(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.delay, value));
    }

    /* Returns the pending value if its deadline has been reached, clearing it. */
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((deadline, _)) if now >= *deadline => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.call("a", start);
        assert_eq!(debouncer.deadline(), Some(start + DELAY));

        assert_eq!(debouncer.poll(start + Duration::from_millis(299)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("a"));
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn test_rapid_calls_collapse_to_last_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        for (i, text) in ["d", "da", "dat", "data"].iter().enumerate() {
            debouncer.call(*text, start + Duration::from_millis(100 * i as u64));
        }
        // Last call was at 300ms, so nothing fires before 600ms.
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(600)),
            Some("data")
        );
    }

    #[test]
    fn test_cancel_drops_pending_value() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        assert!(!debouncer.cancel());
        debouncer.call(1, start);
        assert!(debouncer.cancel());
        assert_eq!(debouncer.poll(start + DELAY), None);
    }
}
