/// The external predicate deciding whether a rendered candidate is free.
///
/// The surrounding application owns the entities that serial numbers end up
/// on (document titles, invoice numbers, ...), so it is the only party that
/// can say whether a string is already taken. The generator may call the
/// oracle up to `max_candidates` times per attempt while holding a row lock,
/// so implementations must be fast and free of side effects.
///
/// Any `Fn(&str) -> bool` closure is an oracle:
///
/// ```
/// use serialno::UniquenessOracle;
///
/// let taken = ["DOC-0001", "DOC-0002"];
/// let oracle = |candidate: &str| !taken.iter().any(|t| *t == candidate);
/// assert!(!oracle.is_available("DOC-0001"));
/// assert!(oracle.is_available("DOC-0003"));
/// ```
pub trait UniquenessOracle {
    /// Returns `true` when no existing entity uses `candidate`.
    fn is_available(&self, candidate: &str) -> bool;
}

impl<F> UniquenessOracle for F
where
    F: Fn(&str) -> bool,
{
    fn is_available(&self, candidate: &str) -> bool {
        self(candidate)
    }
}

/// An oracle that considers every candidate free.
///
/// Useful when the counter store's own issued ledger is the only uniqueness
/// constraint that matters.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl UniquenessOracle for AcceptAll {
    fn is_available(&self, _candidate: &str) -> bool {
        true
    }
}
