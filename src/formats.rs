use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{CanonicalColumn, Transaction};
use crate::normalize::{clean_description, try_normalize_amount, try_standardize_date};

// ---------------------------------------------------------------------------
// Header / row access
// ---------------------------------------------------------------------------

/// Column names of an export, trimmed and with any UTF-8 BOM removed.
#[derive(Debug, Clone)]
pub struct Header {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns: Vec<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let mut index = HashMap::new();
        for (i, name) in columns.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { columns, index }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn row<'a>(&'a self, record: &'a csv::StringRecord) -> Row<'a> {
        Row {
            header: self,
            record,
        }
    }
}

/// One raw CSV record viewed through its header.
pub struct Row<'a> {
    header: &'a Header,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    /// Raw cell value; empty when the column or cell is absent.
    pub fn get(&self, column: &str) -> &str {
        self.header
            .index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .unwrap_or("")
    }
}

/// Output of one adapter invocation: the canonical transaction plus the
/// number of fields that failed to parse and were degraded.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub transaction: Transaction,
    pub degraded: usize,
}

struct FieldReader<'r, 'a> {
    row: &'r Row<'a>,
    degraded: usize,
}

impl<'r, 'a> FieldReader<'r, 'a> {
    fn new(row: &'r Row<'a>) -> Self {
        Self { row, degraded: 0 }
    }

    fn date(&mut self, column: &str) -> Option<NaiveDate> {
        let raw = self.row.get(column);
        if raw.trim().is_empty() {
            return None;
        }
        match try_standardize_date(raw) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::debug!("{column}: {e}, using null date");
                self.degraded += 1;
                None
            }
        }
    }

    fn amount(&mut self, column: &str) -> Decimal {
        let raw = self.row.get(column);
        if raw.trim().is_empty() {
            return Decimal::ZERO;
        }
        match try_normalize_amount(raw) {
            Ok(amount) => amount,
            Err(e) => {
                tracing::debug!("{column}: {e}, using zero");
                self.degraded += 1;
                Decimal::ZERO
            }
        }
    }

    /// Exports that record spending as positive; zero stays unsigned.
    fn negated_amount(&mut self, column: &str) -> Decimal {
        let amount = self.amount(column);
        if amount.is_zero() {
            Decimal::ZERO
        } else {
            -amount
        }
    }

    /// Credit minus Debit. A pair whose difference overflows degrades to zero.
    fn net_amount(&mut self, credit: &str, debit: &str) -> Decimal {
        let credit_amount = self.amount(credit);
        let debit_amount = self.amount(debit);
        match credit_amount.checked_sub(debit_amount) {
            Some(net) if net.is_zero() => Decimal::ZERO,
            Some(net) => net,
            None => {
                tracing::debug!("{credit} - {debit} overflows, using zero");
                self.degraded += 1;
                Decimal::ZERO
            }
        }
    }

    fn text(&self, column: &str) -> String {
        self.row.get(column).trim().to_string()
    }

    fn description(&self) -> String {
        clean_description(self.row.get("Description"))
    }
}

// ---------------------------------------------------------------------------
// Format kinds: enum dispatch over the supported exports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    Discover,
    Amex,
    CapitalOne,
    Chase,
    AlliantChecking,
    AlliantVisa,
    Aggregator,
}

/// Most specific signature first so that a loose signature never claims a
/// file belonging to a stricter one (Alliant Visa before Alliant Checking).
pub const DETECTION_ORDER: &[FormatKind] = &[
    FormatKind::Aggregator,
    FormatKind::AlliantVisa,
    FormatKind::CapitalOne,
    FormatKind::Amex,
    FormatKind::Discover,
    FormatKind::Chase,
    FormatKind::AlliantChecking,
];

pub const DETAIL_COLUMNS: &[CanonicalColumn] = &[
    CanonicalColumn::TransactionDate,
    CanonicalColumn::PostDate,
    CanonicalColumn::Description,
    CanonicalColumn::Amount,
];

const AGGREGATOR_COLUMNS: &[CanonicalColumn] = &[
    CanonicalColumn::TransactionDate,
    CanonicalColumn::PostDate,
    CanonicalColumn::Description,
    CanonicalColumn::Amount,
    CanonicalColumn::Category,
    CanonicalColumn::Tags,
    CanonicalColumn::Account,
];

impl FormatKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::Amex => "amex",
            Self::CapitalOne => "capital_one",
            Self::Chase => "chase",
            Self::AlliantChecking => "alliant_checking",
            Self::AlliantVisa => "alliant_visa",
            Self::Aggregator => "aggregator",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Discover => "Discover",
            Self::Amex => "American Express",
            Self::CapitalOne => "Capital One",
            Self::Chase => "Chase",
            Self::AlliantChecking => "Alliant Checking",
            Self::AlliantVisa => "Alliant Visa",
            Self::Aggregator => "Aggregator ledger",
        }
    }

    /// Header columns that must all be present for this format to claim a file.
    pub fn signature(&self) -> &'static [&'static str] {
        match self {
            Self::Discover => &["Trans. Date", "Post Date", "Description", "Amount"],
            Self::Amex => &["Date", "Description", "Card Member", "Account #", "Amount"],
            Self::CapitalOne => &[
                "Transaction Date",
                "Posted Date",
                "Description",
                "Debit",
                "Credit",
            ],
            Self::Chase => &["Details", "Posting Date", "Description", "Amount"],
            Self::AlliantChecking => &["Date", "Description", "Amount", "Balance"],
            Self::AlliantVisa => &["Date", "Post Date", "Description", "Amount", "Balance"],
            Self::Aggregator => &["Date", "Account", "Description", "Category", "Tags", "Amount"],
        }
    }

    /// Canonical columns this format sources from the export itself.
    pub fn columns(&self) -> &'static [CanonicalColumn] {
        match self {
            Self::Aggregator => AGGREGATOR_COLUMNS,
            _ => DETAIL_COLUMNS,
        }
    }

    pub fn is_aggregator(&self) -> bool {
        matches!(self, Self::Aggregator)
    }

    pub fn detect(&self, header: &Header) -> bool {
        self.signature().iter().all(|c| header.contains(c))
    }

    pub fn normalize(&self, row: &Row, source_file: &str) -> Normalized {
        let mut f = FieldReader::new(row);
        let transaction = match self {
            Self::Discover => {
                let amount = f.negated_amount("Amount");
                Transaction {
                    transaction_date: f.date("Trans. Date"),
                    post_date: f.date("Post Date"),
                    description: f.description(),
                    amount,
                    category: f.text("Category"),
                    tags: String::new(),
                    account: String::new(),
                    source_file: source_file.to_string(),
                }
            }
            Self::Amex => {
                let date = f.date("Date");
                Transaction {
                    transaction_date: date,
                    post_date: date,
                    description: f.description(),
                    amount: f.negated_amount("Amount"),
                    category: f.text("Category"),
                    tags: String::new(),
                    account: String::new(),
                    source_file: source_file.to_string(),
                }
            }
            Self::CapitalOne => {
                let amount = f.net_amount("Credit", "Debit");
                Transaction {
                    transaction_date: f.date("Transaction Date"),
                    post_date: f.date("Posted Date"),
                    description: f.description(),
                    amount,
                    category: f.text("Category"),
                    tags: String::new(),
                    account: String::new(),
                    source_file: source_file.to_string(),
                }
            }
            Self::Chase => {
                let date = f.date("Posting Date");
                Transaction {
                    transaction_date: date,
                    post_date: date,
                    description: f.description(),
                    amount: f.amount("Amount"),
                    category: f.text("Category"),
                    tags: String::new(),
                    account: String::new(),
                    source_file: source_file.to_string(),
                }
            }
            Self::AlliantChecking => {
                let date = f.date("Date");
                Transaction {
                    transaction_date: date,
                    post_date: date,
                    description: f.description(),
                    amount: f.negated_amount("Amount"),
                    category: f.text("Category"),
                    tags: String::new(),
                    account: String::new(),
                    source_file: source_file.to_string(),
                }
            }
            Self::AlliantVisa => Transaction {
                transaction_date: f.date("Date"),
                post_date: f.date("Post Date"),
                description: f.description(),
                amount: f.negated_amount("Amount"),
                category: f.text("Category"),
                tags: String::new(),
                account: String::new(),
                source_file: source_file.to_string(),
            },
            Self::Aggregator => {
                let date = f.date("Date");
                Transaction {
                    transaction_date: date,
                    post_date: date,
                    description: f.description(),
                    amount: f.amount("Amount"),
                    category: f.text("Category"),
                    tags: f.text("Tags"),
                    account: f.text("Account"),
                    source_file: source_file.to_string(),
                }
            }
        };
        Normalized {
            transaction,
            degraded: f.degraded,
        }
    }
}

pub fn get_by_key(key: &str) -> Option<FormatKind> {
    DETECTION_ORDER.iter().find(|k| k.key() == key).copied()
}

/// First format in [`DETECTION_ORDER`] whose signature the header satisfies.
pub fn detect_format(header: &Header) -> Option<FormatKind> {
    DETECTION_ORDER.iter().find(|k| k.detect(header)).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn normalize(kind: FormatKind, columns: &[&str], values: &[&str]) -> Normalized {
        let header = Header::new(columns);
        let record = csv::StringRecord::from(values.to_vec());
        kind.normalize(&header.row(&record), "fixture.csv")
    }

    fn amount_of(kind: FormatKind, columns: &[&str], values: &[&str]) -> Decimal {
        normalize(kind, columns, values).transaction.amount
    }

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    const DISCOVER: &[&str] = &["Trans. Date", "Post Date", "Description", "Amount", "Category"];
    const AMEX: &[&str] = &["Date", "Description", "Card Member", "Account #", "Amount", "Category"];
    const CAPITAL_ONE: &[&str] = &[
        "Transaction Date",
        "Posted Date",
        "Card No.",
        "Description",
        "Category",
        "Debit",
        "Credit",
    ];
    const CHASE: &[&str] = &[
        "Details",
        "Posting Date",
        "Description",
        "Amount",
        "Type",
        "Balance",
        "Check or Slip #",
    ];
    const ALLIANT_CHECKING: &[&str] = &["Date", "Description", "Amount", "Balance", "Category"];
    const ALLIANT_VISA: &[&str] = &["Date", "Description", "Amount", "Balance", "Post Date", "Category"];
    const AGGREGATOR: &[&str] = &["Date", "Account", "Description", "Category", "Tags", "Amount"];

    #[test]
    fn test_discover_normalize() {
        let n = normalize(
            FormatKind::Discover,
            DISCOVER,
            &["03/17/2025", "03/18/2025", "AMAZON.COM", "40.33", "Shopping"],
        );
        let t = n.transaction;
        assert_eq!(t.transaction_date, ymd(2025, 3, 17));
        assert_eq!(t.post_date, ymd(2025, 3, 18));
        assert_eq!(t.description, "AMAZON.COM");
        assert_eq!(t.amount, dec!(-40.33));
        assert_eq!(t.category, "Shopping");
        assert_eq!(t.source_file, "fixture.csv");
        assert_eq!(n.degraded, 0);
    }

    #[test]
    fn test_amex_uses_single_date_for_both() {
        let t = normalize(
            FormatKind::Amex,
            AMEX,
            &["03/13/2025", "AT&T UVERSE PAYMENT", "PRICE L HATFIELD", "-42004", "126.12", "Telephone"],
        )
        .transaction;
        assert_eq!(t.transaction_date, ymd(2025, 3, 13));
        assert_eq!(t.post_date, t.transaction_date);
        assert_eq!(t.amount, dec!(-126.12));
    }

    #[test]
    fn test_capital_one_credit_minus_debit() {
        let t = normalize(
            FormatKind::CapitalOne,
            CAPITAL_ONE,
            &["2025-03-17", "2025-03-18", "1234", "AMAZON.COM", "Shopping", "$40.33", ""],
        )
        .transaction;
        assert_eq!(t.transaction_date, ymd(2025, 3, 17));
        assert_eq!(t.post_date, ymd(2025, 3, 18));
        assert_eq!(t.amount, dec!(-40.33));
    }

    #[test]
    fn test_capital_one_overflow_degrades_to_zero() {
        let n = normalize(
            FormatKind::CapitalOne,
            CAPITAL_ONE,
            &[
                "2025-03-17",
                "2025-03-18",
                "1234",
                "REFUND",
                "Shopping",
                "-1",
                "79228162514264337593543950335",
            ],
        );
        assert_eq!(n.transaction.amount, Decimal::ZERO);
        assert_eq!(n.degraded, 1);
    }

    #[test]
    fn test_zero_amount_is_not_negative() {
        let n = normalize(
            FormatKind::Discover,
            DISCOVER,
            &["03/17/2025", "03/18/2025", "ADJUSTMENT", "0.00", ""],
        );
        assert!(n.transaction.amount.is_zero());
        assert!(!n.transaction.amount.is_sign_negative());
    }

    #[test]
    fn test_chase_pass_through() {
        let t = normalize(
            FormatKind::Chase,
            CHASE,
            &["DEBIT", "03/17/2025", "AMAZON.COM", "-$40.33", "ACH_DEBIT", "$1000.00", ""],
        )
        .transaction;
        assert_eq!(t.transaction_date, ymd(2025, 3, 17));
        assert_eq!(t.post_date, ymd(2025, 3, 17));
        assert_eq!(t.amount, dec!(-40.33));
        assert_eq!(t.category, "");
    }

    #[test]
    fn test_alliant_visa_dates_and_currency() {
        let t = normalize(
            FormatKind::AlliantVisa,
            ALLIANT_VISA,
            &["2025-03-17", "AMAZON.COM", "$123.45", "$1,000.00", "2025-03-18", "Shopping"],
        )
        .transaction;
        assert_eq!(t.transaction_date, ymd(2025, 3, 17));
        assert_eq!(t.post_date, ymd(2025, 3, 18));
        assert_eq!(t.amount, dec!(-123.45));
    }

    #[test]
    fn test_alliant_checking_strips_newlines() {
        let t = normalize(
            FormatKind::AlliantChecking,
            ALLIANT_CHECKING,
            &["03/17/2025", "DIVIDEND\n\nPAYMENT\nQ1 2025", "$123.45", "$1,000.00", ""],
        )
        .transaction;
        assert_eq!(t.description, "DIVIDEND PAYMENT Q1 2025");
        assert_eq!(t.post_date, ymd(2025, 3, 17));
    }

    #[test]
    fn test_aggregator_carries_metadata() {
        let t = normalize(
            FormatKind::Aggregator,
            AGGREGATOR,
            &["2025-03-13", "Hilton Honors Surpass Card - Ending in 2004", "At&t Uverse Payment", "Telephone", "Joint", "-126.12"],
        )
        .transaction;
        assert_eq!(t.account, "Hilton Honors Surpass Card - Ending in 2004");
        assert_eq!(t.category, "Telephone");
        assert_eq!(t.tags, "Joint");
        assert_eq!(t.amount, dec!(-126.12));
        assert_eq!(t.post_date, ymd(2025, 3, 13));
    }

    #[test]
    fn test_sign_invariant_per_format() {
        let cases: Vec<(FormatKind, &[&str], Vec<&str>, Vec<&str>)> = vec![
            (
                FormatKind::Discover,
                DISCOVER,
                vec!["01/01/2025", "01/02/2025", "COFFEE", "4.50", ""],
                vec!["01/01/2025", "01/02/2025", "REFUND", "-20.00", ""],
            ),
            (
                FormatKind::Amex,
                AMEX,
                vec!["01/01/2025", "COFFEE", "X", "-1", "4.50", ""],
                vec!["01/01/2025", "PAYMENT", "X", "-1", "-250.91", ""],
            ),
            (
                FormatKind::CapitalOne,
                CAPITAL_ONE,
                vec!["2025-01-01", "2025-01-02", "1", "COFFEE", "", "50.00", ""],
                vec!["2025-01-01", "2025-01-02", "1", "PAYMENT", "", "", "75.00"],
            ),
            (
                FormatKind::Chase,
                CHASE,
                vec!["DEBIT", "01/01/2025", "COFFEE", "-95.89", "ACH_DEBIT", "0", ""],
                vec!["CREDIT", "01/01/2025", "PAYROLL", "1500.00", "ACH_CREDIT", "0", ""],
            ),
            (
                FormatKind::AlliantChecking,
                ALLIANT_CHECKING,
                vec!["01/01/2025", "COFFEE", "$50.00", "$1,000.00", ""],
                vec!["01/01/2025", "DIVIDEND", "-$3.10", "$1,003.10", ""],
            ),
            (
                FormatKind::AlliantVisa,
                ALLIANT_VISA,
                vec!["01/01/2025", "COFFEE", "$50.00", "$0.00", "01/02/2025", ""],
                vec!["01/01/2025", "PAYMENT", "-$500.00", "$0.00", "01/02/2025", ""],
            ),
            (
                FormatKind::Aggregator,
                AGGREGATOR,
                vec!["2025-01-01", "Chase", "COFFEE", "Dining", "", "-4.50"],
                vec!["2025-01-01", "Chase", "PAYROLL", "Income", "", "1500.00"],
            ),
        ];
        for (kind, columns, debit, credit) in cases {
            assert!(amount_of(kind, columns, &debit) < Decimal::ZERO, "{} debit", kind.key());
            assert!(amount_of(kind, columns, &credit) > Decimal::ZERO, "{} credit", kind.key());
        }
    }

    #[test]
    fn test_malformed_fields_degrade() {
        let n = normalize(
            FormatKind::Discover,
            DISCOVER,
            &["12345", "not-a-date", "TEST", "not a number", "Test"],
        );
        assert_eq!(n.transaction.transaction_date, None);
        assert_eq!(n.transaction.post_date, None);
        assert_eq!(n.transaction.amount, Decimal::ZERO);
        assert_eq!(n.degraded, 3);
    }

    #[test]
    fn test_missing_optional_columns_are_empty() {
        let t = normalize(
            FormatKind::Discover,
            &["Trans. Date", "Post Date", "Description", "Amount"],
            &["01/01/2025", "01/01/2025", "Test", "1.00"],
        )
        .transaction;
        assert_eq!(t.category, "");
        assert_eq!(t.tags, "");
        assert_eq!(t.account, "");
    }

    #[test]
    fn test_detection_prefers_specific_signatures() {
        assert_eq!(detect_format(&Header::new(ALLIANT_VISA)), Some(FormatKind::AlliantVisa));
        assert_eq!(detect_format(&Header::new(ALLIANT_CHECKING)), Some(FormatKind::AlliantChecking));
        assert_eq!(detect_format(&Header::new(AGGREGATOR)), Some(FormatKind::Aggregator));
        assert_eq!(detect_format(&Header::new(AMEX)), Some(FormatKind::Amex));
        assert_eq!(detect_format(&Header::new(DISCOVER)), Some(FormatKind::Discover));
        assert_eq!(detect_format(&Header::new(CAPITAL_ONE)), Some(FormatKind::CapitalOne));
        assert_eq!(detect_format(&Header::new(CHASE)), Some(FormatKind::Chase));
        assert_eq!(detect_format(&Header::new(["Foo", "Bar"])), None);
    }

    #[test]
    fn test_detection_order_is_most_specific_first() {
        let sizes: Vec<usize> = DETECTION_ORDER.iter().map(|k| k.signature().len()).collect();
        assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "{sizes:?}");
        assert_eq!(DETECTION_ORDER.len(), 7);
    }

    #[test]
    fn test_header_trims_and_strips_bom() {
        let header = Header::new(["\u{feff}Date", " Description ", "Amount", "Balance"]);
        assert!(header.contains("Date"));
        assert!(header.contains("Description"));
        assert_eq!(detect_format(&header), Some(FormatKind::AlliantChecking));
    }

    #[test]
    fn test_get_by_key() {
        assert_eq!(get_by_key("capital_one"), Some(FormatKind::CapitalOne));
        assert_eq!(get_by_key("nope"), None);
    }
}
