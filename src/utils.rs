use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Rounds to two decimals, the precision used for every reported ratio.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Collapses runs of whitespace (including non-breaking spaces) to a single space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Strips a namespace prefix such as `se-gen-base:` from a concept name.
pub fn local_name(concept: &str) -> &str {
    match concept.rsplit_once(':') {
        Some((_, name)) => name,
        None => concept,
    }
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Calendar months elapsed between two dates, not counting a month until its day is reached.
pub fn whole_months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let months = months_between(start, end);
    if months > 0 && end.day() < start.day() {
        months - 1
    } else {
        months
    }
}

/// Lenient ISO date reader for tagged text and registry timestamps ("2023-12-31T00:00:00").
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
