//! Serial pattern parsing and rendering.
//!
//! A pattern is literal text interleaved with two kinds of token:
//!
//! - `{DATE}` or `{DATE:<fmt>}`: the render timestamp, formatted with
//!   [`DEFAULT_DATE_FORMAT`] or `<fmt>` (see [`DateFormat`]).
//! - `{NUMBER:<width>}`: the trial number, zero-padded to at least `<width>`
//!   digits. Wider numbers are never truncated.
//!
//! Anything that does not parse as one of those tokens is kept verbatim, so
//! rendering never fails.
//!
//! [`DEFAULT_DATE_FORMAT`]: crate::DEFAULT_DATE_FORMAT

mod date;
#[cfg(test)]
mod tests;

pub use date::DateFormat;

use crate::time::DEFAULT_DATE_FORMAT;
use chrono::NaiveDateTime;
use core::fmt::Write;

/// Widest `{NUMBER:<width>}` accepted. Larger widths render as literal text,
/// which bounds the allocation a single candidate can cause.
pub const MAX_NUMBER_WIDTH: usize = 4096;

const DATE_TOKEN: &str = "DATE";
const DATE_PREFIX: &str = "DATE:";
const NUMBER_PREFIX: &str = "NUMBER:";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Date(DateFormat),
    Number { width: usize },
}

/// A pre-tokenized pattern.
///
/// Parsing once and rendering many times keeps the candidate search loop from
/// re-scanning the template for every trial number.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use serialno::Pattern;
///
/// let at = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let pattern = Pattern::parse("DOC-{DATE:yyyy}-{NUMBER:4}");
/// assert_eq!(pattern.render(7, at), "DOC-2025-0007");
/// assert_eq!(pattern.render(8, at), "DOC-2025-0008");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = pattern;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let token = after
                .find('}')
                .and_then(|close| parse_token(&after[..close]).map(|seg| (seg, close)));

            match token {
                Some((segment, close)) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(core::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                    rest = &after[close + 1..];
                }
                None => {
                    literal.push('{');
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Renders the pattern for `number` at `at`.
    pub fn render(&self, number: u64, at: NaiveDateTime) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Date(format) => format.write(&mut out, at),
                &Segment::Number { width } => {
                    // Writing into a String cannot fail.
                    let _ = write!(out, "{number:0width$}");
                }
            }
        }
        out
    }

    /// Whether any `{NUMBER:<width>}` token is present.
    ///
    /// Without one every candidate for the same instant renders identically,
    /// so only the first generation can ever succeed.
    pub fn has_number(&self) -> bool {
        self.segments
            .iter()
            .any(|seg| matches!(seg, Segment::Number { .. }))
    }
}

/// Renders `pattern` for a single `number` and timestamp.
///
/// Shorthand for [`Pattern::parse`] followed by [`Pattern::render`].
pub fn render(pattern: &str, number: u64, at: NaiveDateTime) -> String {
    Pattern::parse(pattern).render(number, at)
}

fn parse_token(inner: &str) -> Option<Segment> {
    if inner == DATE_TOKEN {
        return Some(Segment::Date(DateFormat::parse(DEFAULT_DATE_FORMAT)));
    }
    if let Some(fmt) = inner.strip_prefix(DATE_PREFIX) {
        return (!fmt.is_empty()).then(|| Segment::Date(DateFormat::parse(fmt)));
    }
    if let Some(width) = inner.strip_prefix(NUMBER_PREFIX) {
        if width.is_empty() || !width.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let width = width.parse::<usize>().ok()?;
        return (width <= MAX_NUMBER_WIDTH).then_some(Segment::Number { width });
    }
    None
}
