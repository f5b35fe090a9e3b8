use core::fmt::Display;

/// Failures raised by a [`CounterStore`] implementation.
///
/// [`CounterStore`]: crate::CounterStore
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The backing database reported an error.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The row lock for `key` could not be acquired in time.
    #[error("timed out waiting for the row lock on `{key}`")]
    LockTimeout { key: String },

    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// A format with this key already exists.
    #[error("key `{key}` already exists")]
    DuplicateKey { key: String },

    /// A locked row disappeared before the unit of work committed.
    #[error("row for `{key}` vanished while locked")]
    MissingRow { key: String },
}

impl StoreError {
    pub(crate) fn backend(err: impl Display) -> Self {
        Self::Backend(err.to_string())
    }

    pub(crate) fn corrupt(err: impl Display) -> Self {
        Self::Corrupt(err.to_string())
    }
}
