use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Format a decimal as a dollar amount with thousands separators: $1,234.56
pub fn money(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Amount as it appears in a reconciled key: trailing zeros dropped, at
/// least one fractional digit (-50.00 -> -50.0).
pub fn key_amount(val: Decimal) -> String {
    let s = val.normalize().to_string();
    if s.contains('.') {
        s
    } else {
        format!("{s}.0")
    }
}

/// Amount as written to the exported CSV. Zero is never signed.
pub fn plain_amount(val: Decimal) -> String {
    if val.is_zero() {
        return "0.00".to_string();
    }
    format!("{:.2}", val)
}

/// ISO date, or empty for the null sentinel.
pub fn iso_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
