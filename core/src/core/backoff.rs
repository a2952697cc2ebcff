/// Adaptive poll pacing for a single worker.
///
/// Each worker sleeps between poll cycles. An empty queue doubles the sleep
/// (capped), a fully processed unit resets it to the base interval, and a
/// transient error leaves it untouched — an error says nothing about queue
/// depth, so it neither grows nor resets the pace.
///
/// Invariant: base <= current <= cap at all times.

use std::time::Duration;

use crate::core::CycleOutcome;

#[derive(Debug, Clone)]
pub struct BackoffState {
    base: Duration,
    cap: Duration,
    current: Duration,
}

impl BackoffState {
    pub fn new(base: Duration, cap: Duration) -> Self {
        let cap = cap.max(base);
        Self { base, cap, current: base }
    }

    /// Returns the delay to sleep after a cycle with the given outcome and
    /// advances the state for the next cycle. The n-th consecutive idle
    /// sleeps `min(base * 2^n, cap)` starting from n = 0.
    pub fn next_delay(&mut self, outcome: CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Idle => {
                let delay = self.current;
                self.current = self.current.saturating_mul(2).min(self.cap);
                delay
            }
            CycleOutcome::Success => {
                self.current = self.base;
                self.base
            }
            CycleOutcome::Error => self.current,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_idle_doubles_until_cap() {
        let mut backoff = BackoffState::new(ms(100), ms(450));

        assert_eq!(backoff.next_delay(CycleOutcome::Idle), ms(100));
        assert_eq!(backoff.next_delay(CycleOutcome::Idle), ms(200));
        assert_eq!(backoff.next_delay(CycleOutcome::Idle), ms(400));
        // Capped from here on.
        assert_eq!(backoff.next_delay(CycleOutcome::Idle), ms(450));
        assert_eq!(backoff.next_delay(CycleOutcome::Idle), ms(450));
    }

    #[test]
    fn test_success_resets_to_base() {
        let mut backoff = BackoffState::new(ms(100), ms(10_000));
        for _ in 0..5 {
            backoff.next_delay(CycleOutcome::Idle);
        }
        assert!(backoff.current() > ms(100));

        assert_eq!(backoff.next_delay(CycleOutcome::Success), ms(100));
        assert_eq!(backoff.current(), ms(100));
    }

    #[test]
    fn test_error_leaves_delay_unchanged() {
        let mut backoff = BackoffState::new(ms(100), ms(10_000));
        backoff.next_delay(CycleOutcome::Idle);
        backoff.next_delay(CycleOutcome::Idle);
        let before = backoff.current();

        assert_eq!(backoff.next_delay(CycleOutcome::Error), before);
        assert_eq!(backoff.current(), before);
    }

    #[test]
    fn test_cap_below_base_is_clamped() {
        let mut backoff = BackoffState::new(ms(500), ms(100));
        assert_eq!(backoff.next_delay(CycleOutcome::Idle), ms(500));
        assert_eq!(backoff.current(), ms(500));
    }
}
