//! Error types surfaced by the serial number service.
//!
//! The taxonomy is split by how callers should react:
//!
//! - [`Error::NotFound`]: the key is unknown or its format is inactive. Never
//!   retried.
//! - [`Error::GenerationExhausted`]: the candidate search hit its guard. This
//!   points at a pathological pattern or oracle and is never retried.
//! - [`Error::TransientStorageFailure`]: locking or committing kept failing
//!   after every outer attempt was used up.
//!
//! Constraint violations at commit time are not errors. They are reported as
//! [`CommitOutcome::Conflict`] and consumed by the generation loop.
//!
//! [`CommitOutcome::Conflict`]: crate::CommitOutcome::Conflict

use crate::{FormatId, StoreError};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors the `serialno` service can emit.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No active format is registered under `key`.
    #[error("no active serial format for key `{key}`")]
    NotFound { key: String },

    /// Every candidate in the search window was rejected.
    #[error("gave up on key `{key}` after {attempts} candidates")]
    GenerationExhausted { key: String, attempts: u64 },

    /// The unit of work failed on every outer attempt.
    #[error("storage failed after {attempts} attempts: {source}")]
    TransientStorageFailure {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// A format with this key already exists.
    #[error("serial format key `{key}` already exists")]
    DuplicateKey { key: String },

    /// A create or replace request carried invalid fields.
    #[error("invalid serial format: {reason}")]
    InvalidFormat { reason: String },

    /// No format is stored under this id.
    #[error("serial format {id} not found")]
    FormatIdNotFound { id: FormatId },

    /// An administrative replace tried to move a counter backwards while the
    /// service runs with [`CounterPolicy::Monotonic`].
    ///
    /// [`CounterPolicy::Monotonic`]: crate::CounterPolicy::Monotonic
    #[error("counter for `{key}` cannot move from {current} back to {requested}")]
    CounterDecrease {
        key: String,
        current: u64,
        requested: u64,
    },

    /// A storage failure outside the generation retry loop.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// Returns `true` for the conditions that mean "this key cannot be used".
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::FormatIdNotFound { .. })
    }
}
