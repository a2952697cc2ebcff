pub mod backoff;
pub mod dispatcher;
pub mod poller;
pub mod stats;

/// Outcome of one poll cycle, driving both the backoff policy and the
/// per-worker tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A work unit was fetched and fully processed (finalized + approved).
    Success,
    /// The work queue was empty.
    Idle,
    /// A transient failure anywhere in the cycle; the worker keeps going.
    Error,
}

impl std::fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleOutcome::Success => write!(f, "success"),
            CycleOutcome::Idle => write!(f, "idle"),
            CycleOutcome::Error => write!(f, "error"),
        }
    }
}
