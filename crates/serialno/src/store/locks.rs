use crate::StoreError;
use core::time::Duration;
use parking_lot::{ArcMutexGuard, Mutex, RawMutex};
use std::{collections::HashMap, sync::Arc};

/// Owned guard over one key's row lock.
pub(crate) type RowGuard = ArcMutexGuard<RawMutex, ()>;

/// Per-key row locks shared by a store instance.
///
/// Stores only create entries for keys that have a row, and hand the guard
/// back through [`KeyLocks::release`] once the row is gone. An entry is
/// dropped only when nothing else holds or waits on its mutex, so a waiter
/// and a recreated row always contend on the same one.
#[derive(Default)]
pub(crate) struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub(crate) fn acquire(&self, key: &str, timeout: Duration) -> Result<RowGuard, StoreError> {
        let lock = {
            let mut locks = self.locks.lock();
            match locks.get(key) {
                Some(lock) => Arc::clone(lock),
                None => Arc::clone(locks.entry(key.to_owned()).or_default()),
            }
        };

        lock.try_lock_arc_for(timeout)
            .ok_or_else(|| StoreError::LockTimeout {
                key: key.to_owned(),
            })
    }

    /// Unlocks `guard` and forgets the entry for `key` if it is now unused.
    pub(crate) fn release(&self, key: &str, guard: RowGuard) {
        drop(guard);

        let mut locks = self.locks.lock();
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.lock().len()
    }
}
