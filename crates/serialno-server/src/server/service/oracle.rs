use serialno::{CounterStore, UniquenessOracle};
use tracing::warn;

/// Treats a candidate as taken when the store's issued ledger already holds
/// it.
///
/// A ledger read failure reports the candidate as available; the commit
/// re-checks the ledger and turns a real duplicate into a skip.
pub struct LedgerOracle<'a, S> {
    store: &'a S,
}

impl<'a, S> LedgerOracle<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

impl<S: CounterStore> UniquenessOracle for LedgerOracle<'_, S> {
    fn is_available(&self, candidate: &str) -> bool {
        match self.store.is_issued(candidate) {
            Ok(issued) => !issued,
            Err(err) => {
                warn!(%candidate, error = %err, "ledger lookup failed, deferring to commit");
                true
            }
        }
    }
}
