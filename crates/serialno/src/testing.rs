//! Test doubles shared by the store and service test suites.

use crate::{
    CounterStore, FormatId, NewFormat, SerialFormat, SleepProvider, StoreError,
};
use core::time::Duration;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// A [`RedbStore`] in a temp dir that is removed when the store is dropped.
///
/// [`RedbStore`]: crate::RedbStore
#[cfg(feature = "redb")]
pub(crate) struct TempRedb {
    store: crate::RedbStore,
    _dir: tempfile::TempDir,
}

#[cfg(feature = "redb")]
impl TempRedb {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::RedbStore::open(dir.path().join("serials.redb")).unwrap();
        Self { store, _dir: dir }
    }
}

#[cfg(feature = "redb")]
impl CounterStore for TempRedb {
    type Lease<'a> = crate::RedbLease<'a>;

    fn lock(&self, key: &str, timeout: Duration) -> Result<Option<Self::Lease<'_>>, StoreError> {
        self.store.lock(key, timeout)
    }

    fn get(&self, key: &str) -> Result<Option<SerialFormat>, StoreError> {
        self.store.get(key)
    }

    fn key_of(&self, id: FormatId) -> Result<Option<String>, StoreError> {
        self.store.key_of(id)
    }

    fn list(&self) -> Result<Vec<SerialFormat>, StoreError> {
        self.store.list()
    }

    fn insert(&self, format: NewFormat) -> Result<SerialFormat, StoreError> {
        self.store.insert(format)
    }

    fn is_issued(&self, value: &str) -> Result<bool, StoreError> {
        self.store.is_issued(value)
    }
}

/// Wraps a store and fails the first `failures` calls to `lock`.
pub(crate) struct FlakyStore<S> {
    inner: S,
    remaining: AtomicU32,
    calls: AtomicU32,
}

impl<S> FlakyStore<S> {
    pub(crate) fn new(inner: S, failures: u32) -> Self {
        Self {
            inner,
            remaining: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn lock_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<S: CounterStore> CounterStore for FlakyStore<S> {
    type Lease<'a>
        = S::Lease<'a>
    where
        Self: 'a;

    fn lock(&self, key: &str, timeout: Duration) -> Result<Option<Self::Lease<'_>>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Backend("connection reset".into()));
        }
        self.inner.lock(key, timeout)
    }

    fn get(&self, key: &str) -> Result<Option<SerialFormat>, StoreError> {
        self.inner.get(key)
    }

    fn key_of(&self, id: FormatId) -> Result<Option<String>, StoreError> {
        self.inner.key_of(id)
    }

    fn list(&self) -> Result<Vec<SerialFormat>, StoreError> {
        self.inner.list()
    }

    fn insert(&self, format: NewFormat) -> Result<SerialFormat, StoreError> {
        self.inner.insert(format)
    }

    fn is_issued(&self, value: &str) -> Result<bool, StoreError> {
        self.inner.is_issued(value)
    }
}

/// Records requested sleeps instead of sleeping.
#[derive(Default)]
pub(crate) struct RecordingSleep {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleep {
    pub(crate) fn slept(&self) -> Vec<Duration> {
        self.slept.lock().clone()
    }
}

impl SleepProvider for &RecordingSleep {
    fn sleep_for(&self, dur: Duration) {
        self.slept.lock().push(dur);
    }
}
