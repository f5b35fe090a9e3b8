use crate::{
    CommitOutcome, CounterLease, CounterStore, FormatId, FormatUpdate, NewFormat, SerialFormat,
    StoreError,
    store::locks::{KeyLocks, RowGuard},
};
use core::time::Duration;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};

/// A [`CounterStore`] that lives in process memory.
///
/// Rows are kept in a key-ordered map. Row locks come from per-key mutexes, so
/// a lease on one key never blocks work on another; the map itself is only
/// locked for the few instructions it takes to read or write a row.
///
/// Nothing survives the process. Use it for tests, demos, or deployments that
/// reseed formats at startup.
#[derive(Default)]
pub struct MemoryStore {
    rows: RwLock<BTreeMap<String, SerialFormat>>,
    ids: RwLock<HashMap<FormatId, String>>,
    issued: Mutex<HashMap<String, String>>,
    next_id: Mutex<u64>,
    locks: KeyLocks,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks.len()
    }
}

pub struct MemoryLease<'a> {
    store: &'a MemoryStore,
    format: SerialFormat,
    _guard: RowGuard,
}

impl CounterStore for MemoryStore {
    type Lease<'a> = MemoryLease<'a>;

    fn lock(&self, key: &str, timeout: Duration) -> Result<Option<MemoryLease<'_>>, StoreError> {
        if !self.rows.read().contains_key(key) {
            return Ok(None);
        }

        let guard = self.locks.acquire(key, timeout)?;

        // The row may have been deleted while we waited.
        let Some(format) = self.rows.read().get(key).cloned() else {
            self.locks.release(key, guard);
            return Ok(None);
        };

        Ok(Some(MemoryLease {
            store: self,
            format,
            _guard: guard,
        }))
    }

    fn get(&self, key: &str) -> Result<Option<SerialFormat>, StoreError> {
        Ok(self.rows.read().get(key).cloned())
    }

    fn key_of(&self, id: FormatId) -> Result<Option<String>, StoreError> {
        Ok(self.ids.read().get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<SerialFormat>, StoreError> {
        Ok(self.rows.read().values().cloned().collect())
    }

    fn insert(&self, format: NewFormat) -> Result<SerialFormat, StoreError> {
        let mut rows = self.rows.write();
        let key = format.key.trim();
        if rows.contains_key(key) {
            return Err(StoreError::DuplicateKey {
                key: key.to_owned(),
            });
        }

        let id = {
            let mut next_id = self.next_id.lock();
            *next_id += 1;
            FormatId::new(*next_id)
        };

        let format = format.into_format(id);
        self.ids.write().insert(id, format.key.clone());
        rows.insert(format.key.clone(), format.clone());
        Ok(format)
    }

    fn is_issued(&self, value: &str) -> Result<bool, StoreError> {
        Ok(self.issued.lock().contains_key(value))
    }
}

impl MemoryLease<'_> {
    fn write_row(&self, format: &SerialFormat) -> Result<(), StoreError> {
        let mut rows = self.store.rows.write();
        match rows.get_mut(&format.key) {
            Some(row) if row.id == format.id => {
                *row = format.clone();
                Ok(())
            }
            _ => Err(StoreError::MissingRow {
                key: format.key.clone(),
            }),
        }
    }
}

impl CounterLease for MemoryLease<'_> {
    fn format(&self) -> &SerialFormat {
        &self.format
    }

    fn commit(&mut self, value: &str, next_number: u64) -> Result<CommitOutcome, StoreError> {
        let mut issued = self.store.issued.lock();
        if issued.contains_key(value) {
            return Ok(CommitOutcome::Conflict);
        }

        let mut updated = self.format.clone();
        updated.current_number = next_number;
        self.write_row(&updated)?;
        issued.insert(value.to_owned(), updated.key.clone());

        self.format = updated;
        Ok(CommitOutcome::Committed)
    }

    fn replace(&mut self, update: FormatUpdate) -> Result<SerialFormat, StoreError> {
        let mut updated = self.format.clone();
        updated.apply(update);
        self.write_row(&updated)?;
        self.format = updated.clone();
        Ok(updated)
    }

    fn remove(self) -> Result<(), StoreError> {
        let MemoryLease {
            store,
            format,
            _guard: guard,
        } = self;

        let removed = {
            let mut rows = store.rows.write();
            match rows.get(&format.key) {
                Some(row) if row.id == format.id => {
                    rows.remove(&format.key);
                    store.ids.write().remove(&format.id);
                    Ok(())
                }
                _ => Err(StoreError::MissingRow {
                    key: format.key.clone(),
                }),
            }
        };

        store.locks.release(&format.key, guard);
        removed
    }
}
