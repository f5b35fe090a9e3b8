use core::time::Duration;

/// Outer attempts per `generate` call.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Candidates tried per outer attempt before giving up.
pub const DEFAULT_MAX_CANDIDATES: u64 = 10_000;

/// Backoff unit; the wait after attempt `n` is `n` times this.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(120);

/// Longest wait for a row lock before the attempt counts as failed.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// How administrative replaces may change a format's counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterPolicy {
    /// Any value is accepted. Moving a counter backwards is logged.
    #[default]
    AllowDecrease,
    /// A replace that lowers the counter is rejected.
    Monotonic,
}

/// Tuning for [`SerialService`].
///
/// [`SerialService`]: crate::SerialService
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Total outer attempts, including the first. Values below 1 act as 1.
    pub max_retries: u32,
    /// Inner guard: candidates rendered and checked per attempt.
    pub max_candidates: u64,
    pub backoff_step: Duration,
    pub lock_timeout: Duration,
    pub counter_policy: CounterPolicy,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            backoff_step: DEFAULT_BACKOFF_STEP,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            counter_policy: CounterPolicy::default(),
        }
    }
}
