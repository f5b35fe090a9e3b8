use crate::{
    CommitOutcome, CounterLease, CounterStore, FormatId, FormatUpdate, NewFormat, SerialFormat,
    StoreError,
    store::locks::{KeyLocks, RowGuard},
};
use core::time::Duration;
use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;

/// key -> JSON-encoded [`SerialFormat`]
const FORMATS: TableDefinition<&str, &[u8]> = TableDefinition::new("serial_formats");
/// format id -> key
const FORMAT_IDS: TableDefinition<u64, &str> = TableDefinition::new("serial_format_ids");
/// issued value -> key of the format that issued it
const ISSUED: TableDefinition<&str, &str> = TableDefinition::new("issued_serials");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_FORMAT_ID: &str = "next_format_id";

/// A [`CounterStore`] persisted in an embedded [`redb`] database file.
///
/// redb allows a single writer at a time, which would serialize every key.
/// Row locks are therefore held in memory per key for the whole unit of work,
/// and the database write transaction is only opened for the commit itself.
/// Each commit re-checks the issued ledger inside the write transaction, so
/// the ledger acts as a unique index even against writers this process does
/// not coordinate with.
pub struct RedbStore {
    db: Database,
    locks: KeyLocks,
}

impl RedbStore {
    /// Opens or creates a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(StoreError::backend)?;

        // Create every table up front so read transactions never see a
        // missing table.
        let txn = db.begin_write().map_err(StoreError::backend)?;
        {
            txn.open_table(FORMATS).map_err(StoreError::backend)?;
            txn.open_table(FORMAT_IDS).map_err(StoreError::backend)?;
            txn.open_table(ISSUED).map_err(StoreError::backend)?;
            txn.open_table(META).map_err(StoreError::backend)?;
        }
        txn.commit().map_err(StoreError::backend)?;

        Ok(Self {
            db,
            locks: KeyLocks::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn lock_entries(&self) -> usize {
        self.locks.len()
    }

    fn read_format(&self, key: &str) -> Result<Option<SerialFormat>, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let formats = txn.open_table(FORMATS).map_err(StoreError::backend)?;
        let row = formats.get(key).map_err(StoreError::backend)?;
        row.map(|bytes| decode(bytes.value())).transpose()
    }
}

pub struct RedbLease<'a> {
    store: &'a RedbStore,
    format: SerialFormat,
    _guard: RowGuard,
}

impl CounterStore for RedbStore {
    type Lease<'a> = RedbLease<'a>;

    fn lock(&self, key: &str, timeout: Duration) -> Result<Option<RedbLease<'_>>, StoreError> {
        if self.read_format(key)?.is_none() {
            return Ok(None);
        }

        let guard = self.locks.acquire(key, timeout)?;

        let Some(format) = self.read_format(key)? else {
            self.locks.release(key, guard);
            return Ok(None);
        };

        Ok(Some(RedbLease {
            store: self,
            format,
            _guard: guard,
        }))
    }

    fn get(&self, key: &str) -> Result<Option<SerialFormat>, StoreError> {
        self.read_format(key)
    }

    fn key_of(&self, id: FormatId) -> Result<Option<String>, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let ids = txn.open_table(FORMAT_IDS).map_err(StoreError::backend)?;
        let key = ids.get(id.get()).map_err(StoreError::backend)?;
        Ok(key.map(|key| key.value().to_owned()))
    }

    fn list(&self) -> Result<Vec<SerialFormat>, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let formats = txn.open_table(FORMATS).map_err(StoreError::backend)?;

        let mut out = Vec::new();
        for entry in formats.iter().map_err(StoreError::backend)? {
            let (_key, bytes) = entry.map_err(StoreError::backend)?;
            out.push(decode(bytes.value())?);
        }
        Ok(out)
    }

    fn insert(&self, format: NewFormat) -> Result<SerialFormat, StoreError> {
        let txn = self.db.begin_write().map_err(StoreError::backend)?;
        let created = insert_row(&txn, format)?;
        txn.commit().map_err(StoreError::backend)?;
        Ok(created)
    }

    fn is_issued(&self, value: &str) -> Result<bool, StoreError> {
        let txn = self.db.begin_read().map_err(StoreError::backend)?;
        let issued = txn.open_table(ISSUED).map_err(StoreError::backend)?;
        Ok(issued.get(value).map_err(StoreError::backend)?.is_some())
    }
}

impl CounterLease for RedbLease<'_> {
    fn format(&self) -> &SerialFormat {
        &self.format
    }

    fn commit(&mut self, value: &str, next_number: u64) -> Result<CommitOutcome, StoreError> {
        let txn = self.store.db.begin_write().map_err(StoreError::backend)?;

        if is_issued_in(&txn, value)? {
            txn.abort().map_err(StoreError::backend)?;
            return Ok(CommitOutcome::Conflict);
        }

        let mut updated = self.format.clone();
        updated.current_number = next_number;
        write_row(&txn, &updated)?;
        {
            let mut issued = txn.open_table(ISSUED).map_err(StoreError::backend)?;
            issued
                .insert(value, updated.key.as_str())
                .map_err(StoreError::backend)?;
        }
        txn.commit().map_err(StoreError::backend)?;

        self.format = updated;
        Ok(CommitOutcome::Committed)
    }

    fn replace(&mut self, update: FormatUpdate) -> Result<SerialFormat, StoreError> {
        let mut updated = self.format.clone();
        updated.apply(update);

        let txn = self.store.db.begin_write().map_err(StoreError::backend)?;
        write_row(&txn, &updated)?;
        txn.commit().map_err(StoreError::backend)?;

        self.format = updated.clone();
        Ok(updated)
    }

    fn remove(self) -> Result<(), StoreError> {
        let RedbLease {
            store,
            format,
            _guard: guard,
        } = self;

        let removed = delete_row(&store.db, &format);
        store.locks.release(&format.key, guard);
        removed
    }
}

fn delete_row(db: &Database, format: &SerialFormat) -> Result<(), StoreError> {
    let txn = db.begin_write().map_err(StoreError::backend)?;
    ensure_same_row(&txn, format)?;
    {
        let mut formats = txn.open_table(FORMATS).map_err(StoreError::backend)?;
        formats
            .remove(format.key.as_str())
            .map_err(StoreError::backend)?;
        let mut ids = txn.open_table(FORMAT_IDS).map_err(StoreError::backend)?;
        ids.remove(format.id.get()).map_err(StoreError::backend)?;
    }
    txn.commit().map_err(StoreError::backend)
}

fn insert_row(txn: &WriteTransaction, format: NewFormat) -> Result<SerialFormat, StoreError> {
    let mut formats = txn.open_table(FORMATS).map_err(StoreError::backend)?;
    let key = format.key.trim();
    if formats.get(key).map_err(StoreError::backend)?.is_some() {
        return Err(StoreError::DuplicateKey {
            key: key.to_owned(),
        });
    }

    let mut meta = txn.open_table(META).map_err(StoreError::backend)?;
    let raw_id = meta
        .get(NEXT_FORMAT_ID)
        .map_err(StoreError::backend)?
        .map_or(1, |id| id.value());
    meta.insert(NEXT_FORMAT_ID, raw_id + 1)
        .map_err(StoreError::backend)?;

    let created = format.into_format(FormatId::new(raw_id));
    formats
        .insert(created.key.as_str(), encode(&created)?.as_slice())
        .map_err(StoreError::backend)?;
    let mut ids = txn.open_table(FORMAT_IDS).map_err(StoreError::backend)?;
    ids.insert(raw_id, created.key.as_str())
        .map_err(StoreError::backend)?;

    Ok(created)
}

fn write_row(txn: &WriteTransaction, format: &SerialFormat) -> Result<(), StoreError> {
    ensure_same_row(txn, format)?;
    let mut formats = txn.open_table(FORMATS).map_err(StoreError::backend)?;
    formats
        .insert(format.key.as_str(), encode(format)?.as_slice())
        .map_err(StoreError::backend)?;
    Ok(())
}

/// Fails unless the stored row for `format.key` still carries `format.id`.
fn ensure_same_row(txn: &WriteTransaction, format: &SerialFormat) -> Result<(), StoreError> {
    let formats = txn.open_table(FORMATS).map_err(StoreError::backend)?;
    let stored = formats
        .get(format.key.as_str())
        .map_err(StoreError::backend)?
        .map(|bytes| decode(bytes.value()))
        .transpose()?;

    match stored {
        Some(stored) if stored.id == format.id => Ok(()),
        _ => Err(StoreError::MissingRow {
            key: format.key.clone(),
        }),
    }
}

fn is_issued_in(txn: &WriteTransaction, value: &str) -> Result<bool, StoreError> {
    let issued = txn.open_table(ISSUED).map_err(StoreError::backend)?;
    Ok(issued.get(value).map_err(StoreError::backend)?.is_some())
}

fn encode(format: &SerialFormat) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(format).map_err(StoreError::corrupt)
}

fn decode(bytes: &[u8]) -> Result<SerialFormat, StoreError> {
    serde_json::from_slice(bytes).map_err(StoreError::corrupt)
}
