use crate::{
    Clock, CommitOutcome, CounterLease, CounterStore, Error, GeneratorConfig, LocalClock, Pattern,
    Result, SleepProvider, StoreError, ThreadSleep, UniquenessOracle, backoff_delay,
};
use chrono::NaiveDateTime;
use tracing::{debug, instrument, trace, warn};

/// A serial number that was committed to the counter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// The rendered identifier.
    pub value: String,
    /// The counter value it was rendered from. The stored counter is now
    /// `number + 1`.
    pub number: u64,
    /// Outer attempts used, starting at 1.
    pub attempts: u32,
    /// Candidates skipped because the oracle or the ledger had them.
    pub skipped: u64,
}

/// Why a single outer attempt ended without a serial.
enum AttemptError {
    /// Surfaces to the caller unchanged.
    Fatal(Error),
    /// Eligible for another outer attempt.
    Transient(StoreError),
}

impl From<StoreError> for AttemptError {
    fn from(err: StoreError) -> Self {
        Self::Transient(err)
    }
}

/// Hands out pattern-formatted serial numbers from a [`CounterStore`].
///
/// Preview is a lock-free read. Generation locks the format's row for the
/// whole candidate search, so concurrent callers for one key take turns while
/// callers for different keys run side by side. Each call either commits
/// exactly one counter advance or leaves the store untouched.
///
/// # Example
///
/// ```
/// use serialno::{AcceptAll, GeneratorConfig, MemoryStore, NewFormat, SerialService};
///
/// let service = SerialService::new(MemoryStore::new(), GeneratorConfig::default());
/// service.create_format(NewFormat::new("memo", "Memos", "M-{NUMBER:3}")).unwrap();
///
/// let first = service.generate("memo", &AcceptAll).unwrap();
/// let second = service.generate("memo", &AcceptAll).unwrap();
/// assert_eq!((first.value.as_str(), first.number), ("M-000", 0));
/// assert_eq!((second.value.as_str(), second.number), ("M-001", 1));
/// assert_eq!(service.preview("memo", None).unwrap(), "M-002");
/// ```
pub struct SerialService<S, C = LocalClock, P = ThreadSleep> {
    pub(crate) store: S,
    pub(crate) clock: C,
    pub(crate) sleep: P,
    pub(crate) config: GeneratorConfig,
}

impl<S: CounterStore> SerialService<S> {
    /// Creates a service reading the local clock and sleeping the calling
    /// thread between attempts.
    pub fn new(store: S, config: GeneratorConfig) -> Self {
        Self::with_parts(store, LocalClock, ThreadSleep, config)
    }
}

impl<S, C, P> SerialService<S, C, P>
where
    S: CounterStore,
    C: Clock,
    P: SleepProvider,
{
    pub fn with_parts(store: S, clock: C, sleep: P, config: GeneratorConfig) -> Self {
        Self {
            store,
            clock,
            sleep,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Renders what the next serial for `key` would look like at `at`
    /// (default: now). Takes no lock and writes nothing.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when `key` is unknown or inactive.
    #[instrument(level = "debug", skip(self))]
    pub fn preview(&self, key: &str, at: Option<NaiveDateTime>) -> Result<String> {
        let format = self
            .store
            .get(key)?
            .filter(|format| format.is_active)
            .ok_or_else(|| not_found(key))?;

        let at = at.unwrap_or_else(|| self.clock.now());
        Ok(Pattern::parse(&format.pattern).render(format.current_number, at))
    }

    /// Commits the next free serial for `key`.
    ///
    /// Candidates are rendered from the stored counter upwards and offered to
    /// `oracle`; the first one it accepts and the store's issued ledger does
    /// not already hold is committed together with the counter advance.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when `key` is unknown or inactive. Not retried.
    /// - [`Error::GenerationExhausted`] when `max_candidates` candidates were
    ///   rejected in one attempt. Not retried.
    /// - [`Error::TransientStorageFailure`] when locking or committing failed
    ///   on every one of `max_retries` attempts.
    #[instrument(level = "debug", skip(self, oracle))]
    pub fn generate<O>(&self, key: &str, oracle: &O) -> Result<Generated>
    where
        O: UniquenessOracle + ?Sized,
    {
        let max_attempts = self.config.max_retries.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(key, oracle) {
                Ok(mut generated) => {
                    generated.attempts = attempt;
                    debug!(
                        value = %generated.value,
                        number = generated.number,
                        attempt,
                        "serial committed"
                    );
                    return Ok(generated);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(source)) if attempt < max_attempts => {
                    let delay = backoff_delay(self.config.backoff_step, attempt);
                    warn!(
                        error = %source,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "generation attempt failed, backing off"
                    );
                    self.sleep.sleep_for(delay);
                    attempt += 1;
                }
                Err(AttemptError::Transient(source)) => {
                    return Err(Error::TransientStorageFailure {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }

    /// One unit of work: lock, search, commit. Dropping the lease on any
    /// early return rolls the attempt back.
    fn attempt<O>(&self, key: &str, oracle: &O) -> Result<Generated, AttemptError>
    where
        O: UniquenessOracle + ?Sized,
    {
        let mut lease = self
            .store
            .lock(key, self.config.lock_timeout)?
            .filter(|lease| lease.format().is_active)
            .ok_or_else(|| AttemptError::Fatal(not_found(key)))?;

        let pattern = Pattern::parse(&lease.format().pattern);
        let mut number = lease.format().current_number;
        let mut skipped = 0;

        for tried in 1..=self.config.max_candidates {
            let Some(next) = number.checked_add(1) else {
                return Err(exhausted(key, tried));
            };

            let candidate = pattern.render(number, self.clock.now());
            if oracle.is_available(&candidate) {
                match lease.commit(&candidate, next)? {
                    CommitOutcome::Committed => {
                        return Ok(Generated {
                            value: candidate,
                            number,
                            attempts: 1,
                            skipped,
                        });
                    }
                    CommitOutcome::Conflict => {
                        debug!(%candidate, number, "candidate already issued, skipping");
                    }
                }
            } else {
                trace!(%candidate, number, "candidate rejected by oracle");
            }

            skipped += 1;
            number = next;
        }

        Err(exhausted(key, self.config.max_candidates))
    }

    /// The stored counter of `key`, whether or not the format is active.
    pub fn counter(&self, key: &str) -> Result<u64> {
        self.store
            .get(key)?
            .map(|format| format.current_number)
            .ok_or_else(|| not_found(key))
    }
}

pub(crate) fn not_found(key: &str) -> Error {
    Error::NotFound {
        key: key.to_owned(),
    }
}

fn exhausted(key: &str, attempts: u64) -> AttemptError {
    warn!(key, attempts, "candidate search exhausted");
    AttemptError::Fatal(Error::GenerationExhausted {
        key: key.to_owned(),
        attempts,
    })
}
