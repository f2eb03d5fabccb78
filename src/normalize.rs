use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{ReconcileError, Result};

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

struct DatePattern {
    re: Regex,
    formats: &'static [&'static str],
}

/// Checked in order; the first pattern whose regex matches decides the
/// format, even if parsing then fails.
fn date_patterns() -> &'static [DatePattern] {
    static PATTERNS: OnceLock<Vec<DatePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"^\d{1,2}/\d{1,2}/\d{4}$", &["%m/%d/%Y"][..]),
            (r"^\d{1,2}-\d{1,2}-\d{4}$", &["%d-%m-%Y"][..]),
            (r"^\d{8}$", &["%Y%m%d", "%m%d%Y"][..]),
            (r"^\d{1,2}/\d{1,2}/\d{2}$", &["%m/%d/%y"][..]),
        ]
        .into_iter()
        .filter_map(|(pattern, formats)| {
            Regex::new(pattern).ok().map(|re| DatePattern { re, formats })
        })
        .collect()
    })
}

fn iso_prefix() -> Option<&'static Regex> {
    static ISO: OnceLock<Option<Regex>> = OnceLock::new();
    ISO.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").ok()).as_ref()
}

/// Tried only when no pattern above claims the input.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%Y-%m-%dT%H:%M:%S",
];

fn malformed_date(raw: &str) -> ReconcileError {
    ReconcileError::MalformedField {
        field: "date",
        value: raw.to_string(),
    }
}

/// Parse a date in any of the supported export layouts.
///
/// Priority: ISO prefix, US slash (MM/DD/YYYY), UK dash (DD-MM-YYYY),
/// compact 8-digit, short year (M/D/YY), then a permissive fallback list.
pub fn try_standardize_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(malformed_date(raw));
    }

    if iso_prefix().is_some_and(|re| re.is_match(s)) {
        return s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .ok_or_else(|| malformed_date(raw));
    }

    if let Some(pattern) = date_patterns().iter().find(|p| p.re.is_match(s)) {
        return pattern
            .formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .ok_or_else(|| malformed_date(raw));
    }

    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| malformed_date(raw))
}

/// Lenient form of [`try_standardize_date`]: `None` for anything unusable.
#[allow(dead_code)]
pub fn standardize_date(raw: &str) -> Option<NaiveDate> {
    try_standardize_date(raw).ok()
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

fn is_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, '$' | '€' | '£' | '¥' | ',' | '"')
}

/// Parse a currency string: strips symbols and thousands separators,
/// treats `(1.00)` as negative.
pub fn try_normalize_amount(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw.chars().filter(|c| !is_noise(*c)).collect();
    let (negated, body) = match cleaned.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, cleaned.as_str()),
    };
    let body = body.strip_prefix('+').unwrap_or(body);
    let value = Decimal::from_str(body)
        .or_else(|_| Decimal::from_scientific(body))
        .map_err(|_| ReconcileError::MalformedField {
            field: "amount",
            value: raw.to_string(),
        })?;
    Ok(if negated { -value } else { value })
}

/// Lenient form of [`try_normalize_amount`]: zero for anything unusable.
#[allow(dead_code)]
pub fn normalize_amount(raw: &str) -> Decimal {
    try_normalize_amount(raw).unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Descriptions
// ---------------------------------------------------------------------------

/// Collapse embedded newlines and whitespace runs into single spaces.
pub fn clean_description(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
