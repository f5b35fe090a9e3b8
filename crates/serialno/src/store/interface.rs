use crate::{FormatId, FormatUpdate, NewFormat, SerialFormat, StoreError};
use core::time::Duration;

/// Result of asking a [`CounterLease`] to commit a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The counter advanced and the value is recorded as issued.
    Committed,
    /// The value is already recorded as issued. Nothing was written and the
    /// lease is still held.
    Conflict,
}

/// An exclusive, transaction-scoped lock on one format row.
///
/// While a lease is alive no other lease for the same key can be acquired.
/// Dropping the lease without committing discards nothing but the lock:
/// writes only happen inside [`CounterLease::commit`],
/// [`CounterLease::replace`] and [`CounterLease::remove`], each of which is
/// atomic on its own.
pub trait CounterLease {
    /// The row as read after the lock was acquired.
    fn format(&self) -> &SerialFormat;

    /// Records `value` as issued and sets the row counter to `next_number`,
    /// atomically.
    ///
    /// Returns [`CommitOutcome::Conflict`] without writing anything when
    /// `value` was issued before; the caller keeps the lock and may try
    /// another value.
    fn commit(&mut self, value: &str, next_number: u64) -> Result<CommitOutcome, StoreError>;

    /// Replaces every mutable field of the locked row.
    fn replace(&mut self, update: FormatUpdate) -> Result<SerialFormat, StoreError>;

    /// Deletes the locked row. Values already issued stay in the ledger.
    fn remove(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// Persisted table of serial formats with per-key pessimistic locking.
///
/// Implementations must guarantee that two callers of [`CounterStore::lock`]
/// for the same key serialize, while callers for different keys proceed in
/// parallel. Plain reads ([`CounterStore::get`], [`CounterStore::list`]) never
/// wait on row locks.
pub trait CounterStore: Send + Sync {
    type Lease<'a>: CounterLease
    where
        Self: 'a;

    /// Locks the row for `key`, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when no row exists for `key`.
    fn lock(&self, key: &str, timeout: Duration) -> Result<Option<Self::Lease<'_>>, StoreError>;

    /// Reads the row for `key` without locking it.
    fn get(&self, key: &str) -> Result<Option<SerialFormat>, StoreError>;

    /// Resolves a format id to its key.
    fn key_of(&self, id: FormatId) -> Result<Option<String>, StoreError>;

    /// Every stored format, ordered by key.
    fn list(&self) -> Result<Vec<SerialFormat>, StoreError>;

    /// Creates a row, assigning its id.
    ///
    /// Fails with [`StoreError::DuplicateKey`] when the key is taken.
    fn insert(&self, format: NewFormat) -> Result<SerialFormat, StoreError>;

    /// Whether `value` was ever committed through a lease.
    fn is_issued(&self, value: &str) -> Result<bool, StoreError>;
}
