use core::time::Duration;

/// Abstracts over how the generator waits between outer attempts.
///
/// The production implementation parks the calling thread. Tests plug in a
/// recorder so retry schedules can be asserted without sleeping.
pub trait SleepProvider {
    fn sleep_for(&self, dur: Duration);
}

/// Blocks the current thread with [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl SleepProvider for ThreadSleep {
    fn sleep_for(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

/// Linear backoff: the wait after failed attempt `n` (1-based) is `step × n`.
pub const fn backoff_delay(step: Duration, attempt: u32) -> Duration {
    step.saturating_mul(attempt)
}
