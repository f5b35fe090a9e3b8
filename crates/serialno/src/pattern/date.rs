use chrono::{Datelike, NaiveDateTime, Timelike};
use core::fmt::Write;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Year,
    Month,
    Day,
    Hour24,
    Hour12,
    Minute,
    Second,
    Fraction,
    Meridiem,
}

impl Field {
    const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'y' => Self::Year,
            'M' => Self::Month,
            'd' => Self::Day,
            'H' => Self::Hour24,
            'h' => Self::Hour12,
            'm' => Self::Minute,
            's' => Self::Second,
            'f' => Self::Fraction,
            't' => Self::Meridiem,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Item {
    Literal(String),
    Field { field: Field, run: usize },
}

/// A parsed custom date format.
///
/// Runs of the same letter select a field and its width, in the style of
/// `dd-MM-yyyy`:
///
/// | run              | output                                   |
/// |------------------|------------------------------------------|
/// | `y` / `yy`       | year modulo 100, unpadded / two digits   |
/// | `yyy`, `yyyy`... | full year padded to the run length       |
/// | `M` / `MM`       | month number, unpadded / two digits      |
/// | `MMM` / `MMMM`   | abbreviated / full month name            |
/// | `d` / `dd`       | day of month, unpadded / two digits      |
/// | `ddd` / `dddd`   | abbreviated / full weekday name          |
/// | `H`, `HH`        | hour 0-23                                |
/// | `h`, `hh`        | hour 1-12                                |
/// | `m`, `mm`        | minute                                   |
/// | `s`, `ss`        | second                                   |
/// | `f`...           | fraction of a second, one digit per `f`  |
/// | `t` / `tt`       | `A`/`P` or `AM`/`PM`                     |
///
/// Text in single or double quotes and any character after a `\` is copied
/// literally. `%` is dropped. Every other character passes through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat {
    items: Vec<Item>,
}

impl DateFormat {
    pub fn parse(fmt: &str) -> Self {
        let mut items = Vec::new();
        let mut literal = String::new();
        let mut chars = fmt.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\'' | '"' => {
                    for q in chars.by_ref() {
                        if q == c {
                            break;
                        }
                        literal.push(q);
                    }
                }
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        literal.push(escaped);
                    }
                }
                '%' => {}
                _ => match Field::from_char(c) {
                    Some(field) => {
                        let mut run = 1;
                        while chars.next_if_eq(&c).is_some() {
                            run += 1;
                        }
                        if !literal.is_empty() {
                            items.push(Item::Literal(core::mem::take(&mut literal)));
                        }
                        items.push(Item::Field { field, run });
                    }
                    None => literal.push(c),
                },
            }
        }

        if !literal.is_empty() {
            items.push(Item::Literal(literal));
        }
        Self { items }
    }

    /// Appends `at` rendered with this format to `out`.
    pub fn write(&self, out: &mut String, at: NaiveDateTime) {
        for item in &self.items {
            match item {
                Item::Literal(text) => out.push_str(text),
                &Item::Field { field, run } => write_field(out, field, run, at),
            }
        }
    }

    pub fn format(&self, at: NaiveDateTime) -> String {
        let mut out = String::new();
        self.write(&mut out, at);
        out
    }
}

fn write_field(out: &mut String, field: Field, run: usize, at: NaiveDateTime) {
    // Writing into a String cannot fail.
    let _ = match field {
        Field::Year => {
            let year = at.year();
            match run {
                1 => write!(out, "{}", year.rem_euclid(100)),
                2 => write!(out, "{:02}", year.rem_euclid(100)),
                _ => write!(out, "{year:0run$}"),
            }
        }
        Field::Month => {
            let index = at.month0() as usize;
            match run {
                1 | 2 => write_number(out, at.month(), run),
                3 => write!(out, "{}", &MONTHS[index][..3]),
                _ => write!(out, "{}", MONTHS[index]),
            }
        }
        Field::Day => {
            let index = at.weekday().num_days_from_monday() as usize;
            match run {
                1 | 2 => write_number(out, at.day(), run),
                3 => write!(out, "{}", &WEEKDAYS[index][..3]),
                _ => write!(out, "{}", WEEKDAYS[index]),
            }
        }
        Field::Hour24 => write_number(out, at.hour(), run.min(2)),
        Field::Hour12 => write_number(out, at.hour12().1, run.min(2)),
        Field::Minute => write_number(out, at.minute(), run.min(2)),
        Field::Second => write_number(out, at.second(), run.min(2)),
        Field::Fraction => {
            let digits = run.min(9);
            let nanos = at.nanosecond() % 1_000_000_000;
            let scaled = nanos / 10u32.pow((9 - digits) as u32);
            write!(out, "{scaled:0digits$}")
        }
        Field::Meridiem => {
            let marker = if at.hour12().0 { "PM" } else { "AM" };
            if run == 1 {
                write!(out, "{}", &marker[..1])
            } else {
                write!(out, "{marker}")
            }
        }
    };
}

fn write_number(out: &mut String, value: u32, run: usize) -> core::fmt::Result {
    if run >= 2 {
        write!(out, "{value:02}")
    } else {
        write!(out, "{value}")
    }
}
