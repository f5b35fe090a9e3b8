use super::*;
use chrono::NaiveDate;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn new_year() -> NaiveDateTime {
    at(2025, 1, 1, 0, 0, 0)
}

#[test]
fn renders_year_and_padded_number() {
    assert_eq!(
        render("DOC-{DATE:yyyy}-{NUMBER:4}", 7, new_year()),
        "DOC-2025-0007"
    );
}

#[test]
fn token_free_pattern_is_unchanged() {
    assert_eq!(render("NO-TOKEN", 7, new_year()), "NO-TOKEN");
    assert_eq!(render("", 7, new_year()), "");
}

#[test]
fn number_wider_than_width_is_not_truncated() {
    assert_eq!(render("{NUMBER:2}", 12345, new_year()), "12345");
    assert_eq!(render("{NUMBER:0}", 0, new_year()), "0");
    assert_eq!(render("{NUMBER:0}", 42, new_year()), "42");
}

#[test]
fn bare_date_uses_default_format() {
    assert_eq!(
        render("{DATE}", 0, at(2024, 3, 9, 13, 5, 0)),
        "09-03-2024"
    );
}

#[test]
fn replaces_every_occurrence() {
    assert_eq!(
        render(
            "{DATE:yy}/{NUMBER:3}/{DATE:MM}/{NUMBER:1}",
            5,
            at(2024, 11, 2, 0, 0, 0)
        ),
        "24/005/11/5"
    );
}

#[test]
fn malformed_tokens_stay_literal() {
    let now = new_year();
    for pattern in [
        "{NUMBER}",
        "{NUMBER:}",
        "{NUMBER:-1}",
        "{NUMBER:+3}",
        "{NUMBER:4x}",
        "{DATE:}",
        "{date}",
        "{FOO:3}",
        "{NUMBER:3",
        "}{",
        "{}",
    ] {
        assert_eq!(render(pattern, 9, now), pattern, "pattern {pattern:?}");
    }
}

#[test]
fn wide_numbers_are_padded() {
    let rendered = render("{NUMBER:65}", 1, new_year());
    assert_eq!(rendered.len(), 65);
    assert!(rendered.ends_with("0001"));
    assert!(rendered.bytes().take(64).all(|b| b == b'0'));

    assert_eq!(render("X{NUMBER:200}", 7, new_year()).len(), 201);
}

#[test]
fn excessive_width_stays_literal() {
    let pattern = format!("{{NUMBER:{}}}", MAX_NUMBER_WIDTH + 1);
    assert_eq!(render(&pattern, 1, new_year()), pattern);

    let widest = format!("{{NUMBER:{MAX_NUMBER_WIDTH}}}");
    assert_eq!(render(&widest, 1, new_year()).len(), MAX_NUMBER_WIDTH);
}

#[test]
fn stray_brace_before_token_is_kept() {
    assert_eq!(render("{{NUMBER:3}}", 4, new_year()), "{004}");
    assert_eq!(render("A{B{NUMBER:2}", 4, new_year()), "A{B04");
}

#[test]
fn parse_once_render_many() {
    let pattern = Pattern::parse("INV-{NUMBER:5}");
    assert!(pattern.has_number());
    let rendered: Vec<_> = (98..101).map(|n| pattern.render(n, new_year())).collect();
    assert_eq!(rendered, ["INV-00098", "INV-00099", "INV-00100"]);

    assert!(!Pattern::parse("{DATE}-{NUMBER}").has_number());
}

#[test]
fn rendering_is_deterministic() {
    let pattern = "X-{DATE:yyyyMMddHHmmss}-{NUMBER:6}";
    let when = at(2023, 7, 4, 18, 30, 15);
    assert_eq!(render(pattern, 77, when), render(pattern, 77, when));
    assert_eq!(render(pattern, 77, when), "X-20230704183015-000077");
}

#[test]
fn date_format_names_and_clock_fields() {
    // 2024-02-05 was a Monday.
    let when = at(2024, 2, 5, 15, 7, 9);
    let fmt = |f: &str| DateFormat::parse(f).format(when);

    assert_eq!(fmt("MMM"), "Feb");
    assert_eq!(fmt("MMMM"), "February");
    assert_eq!(fmt("ddd"), "Mon");
    assert_eq!(fmt("dddd"), "Monday");
    assert_eq!(fmt("d/M/y"), "5/2/24");
    assert_eq!(fmt("hh:mm tt"), "03:07 PM");
    assert_eq!(fmt("h t"), "3 P");
    assert_eq!(fmt("H:m:s"), "15:7:9");
}

#[test]
fn date_format_fraction_digits() {
    let when = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_milli_opt(0, 0, 0, 123)
        .unwrap();
    let fmt = |f: &str| DateFormat::parse(f).format(when);
    assert_eq!(fmt("f"), "1");
    assert_eq!(fmt("ff"), "12");
    assert_eq!(fmt("fff"), "123");
    assert_eq!(fmt("ffff"), "1230");
}

#[test]
fn date_format_quotes_and_escapes() {
    let when = at(2024, 12, 31, 0, 0, 0);
    let fmt = |f: &str| DateFormat::parse(f).format(when);
    assert_eq!(fmt("'yyyy' yyyy"), "yyyy 2024");
    assert_eq!(fmt("\"dd\"-dd"), "dd-31");
    assert_eq!(fmt("\\y yy"), "y 24");
    assert_eq!(fmt("%d"), "31");
    assert_eq!(fmt("Q-yyyy_MM"), "Q-2024_12");
}

#[test]
fn long_year_runs_pad() {
    let when = at(987, 6, 1, 0, 0, 0);
    let fmt = |f: &str| DateFormat::parse(f).format(when);
    assert_eq!(fmt("yyyy"), "0987");
    assert_eq!(fmt("yyy"), "987");
    assert_eq!(fmt("yyyyy"), "00987");
    assert_eq!(fmt("yy"), "87");
}
