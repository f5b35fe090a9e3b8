use chrono::{Local, NaiveDateTime};

/// The default date format used by a bare `{DATE}` token.
pub const DEFAULT_DATE_FORMAT: &str = "dd-MM-yyyy";

/// A source of wall-clock timestamps used when rendering candidates.
///
/// Serial patterns embed local calendar dates, so the clock returns a
/// [`NaiveDateTime`] in the local time zone. Swap in [`FixedClock`] (or your
/// own implementation) to make rendering deterministic in tests.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use serialno::{Clock, FixedClock};
///
/// let at = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let clock = FixedClock::new(at);
/// assert_eq!(clock.now(), at);
/// ```
pub trait Clock {
    /// Returns the current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system clock in the local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a single instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock {
    at: NaiveDateTime,
}

impl FixedClock {
    pub const fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.at
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
