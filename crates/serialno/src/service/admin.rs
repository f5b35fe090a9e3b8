use crate::{
    Clock, CounterLease, CounterPolicy, CounterStore, Error, FormatId, FormatUpdate, NewFormat,
    Pattern, Result, SerialFormat, SerialService, SleepProvider, StoreError,
    service::generator::not_found,
};
use tracing::{info, instrument, warn};

/// Format administration.
///
/// Every write goes through the row lock of the affected key, so it waits for
/// in-flight generations of that key and never interleaves with one.
impl<S, C, P> SerialService<S, C, P>
where
    S: CounterStore,
    C: Clock,
    P: SleepProvider,
{
    /// Registers a new format.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidFormat`] for blank or oversized fields and
    /// [`Error::DuplicateKey`] when the key is taken.
    #[instrument(level = "debug", skip(self), fields(key = %format.key))]
    pub fn create_format(&self, format: NewFormat) -> Result<SerialFormat> {
        format.validate()?;
        if !Pattern::parse(&format.pattern).has_number() {
            warn!(
                pattern = %format.pattern,
                "pattern has no {{NUMBER:<width>}} token, candidates will repeat"
            );
        }

        let created = self.store.insert(format).map_err(|err| match err {
            StoreError::DuplicateKey { key } => Error::DuplicateKey { key },
            other => Error::Store(other),
        })?;
        info!(id = %created.id, key = %created.key, "serial format created");
        Ok(created)
    }

    /// Replaces every mutable field of format `id`. The key never changes.
    ///
    /// # Errors
    ///
    /// [`Error::FormatIdNotFound`] for an unknown id, [`Error::InvalidFormat`]
    /// for invalid fields, and [`Error::CounterDecrease`] when the counter
    /// would go down under [`CounterPolicy::Monotonic`].
    #[instrument(level = "debug", skip(self, update))]
    pub fn replace_format(&self, id: FormatId, update: FormatUpdate) -> Result<SerialFormat> {
        update.validate()?;
        let mut lease = self.lock_by_id(id)?;

        let current = lease.format().current_number;
        if update.current_number < current {
            match self.config.counter_policy {
                CounterPolicy::Monotonic => {
                    return Err(Error::CounterDecrease {
                        key: lease.format().key.clone(),
                        current,
                        requested: update.current_number,
                    });
                }
                CounterPolicy::AllowDecrease => warn!(
                    key = %lease.format().key,
                    current,
                    requested = update.current_number,
                    "counter moved backwards by administrator"
                ),
            }
        }

        let replaced = lease.replace(update)?;
        info!(%id, key = %replaced.key, "serial format replaced");
        Ok(replaced)
    }

    /// Deletes format `id`. Serials it already issued are unaffected.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_format(&self, id: FormatId) -> Result<()> {
        let lease = self.lock_by_id(id)?;
        let key = lease.format().key.clone();
        lease.remove()?;
        info!(%id, %key, "serial format deleted");
        Ok(())
    }

    pub fn format(&self, id: FormatId) -> Result<SerialFormat> {
        let key = self
            .store
            .key_of(id)?
            .ok_or(Error::FormatIdNotFound { id })?;
        self.store
            .get(&key)?
            .filter(|format| format.id == id)
            .ok_or(Error::FormatIdNotFound { id })
    }

    /// Looks up a format by key, active or not.
    pub fn format_by_key(&self, key: &str) -> Result<SerialFormat> {
        self.store.get(key)?.ok_or_else(|| not_found(key))
    }

    /// Every format, ordered by key.
    pub fn formats(&self) -> Result<Vec<SerialFormat>> {
        Ok(self.store.list()?)
    }

    fn lock_by_id(&self, id: FormatId) -> Result<S::Lease<'_>> {
        let key = self
            .store
            .key_of(id)?
            .ok_or(Error::FormatIdNotFound { id })?;
        self.store
            .lock(&key, self.config.lock_timeout)?
            .filter(|lease| lease.format().id == id)
            .ok_or(Error::FormatIdNotFound { id })
    }
}
