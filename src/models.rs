use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::fmt::{iso_date, key_amount};

/// Canonical transaction shape every format adapter converges to.
///
/// `None` dates are the null sentinel for empty or unparsable input.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_date: Option<NaiveDate>,
    pub post_date: Option<NaiveDate>,
    pub description: String,
    /// Negative = money out, positive = money in.
    pub amount: Decimal,
    pub category: String,
    pub tags: String,
    pub account: String,
    pub source_file: String,
}

/// Canonical columns an adapter actually sources from its export (as opposed
/// to filling with an empty default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalColumn {
    TransactionDate,
    PostDate,
    Description,
    Amount,
    Category,
    Tags,
    Account,
}

impl CanonicalColumn {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TransactionDate => "Transaction Date",
            Self::PostDate => "Post Date",
            Self::Description => "Description",
            Self::Amount => "Amount",
            Self::Category => "Category",
            Self::Tags => "Tags",
            Self::Account => "Account",
        }
    }
}

/// One imported batch: the rows of a single file plus the canonical columns
/// its adapter provides.
#[derive(Debug, Clone)]
pub struct TransactionSet {
    pub name: String,
    pub columns: Vec<CanonicalColumn>,
    pub transactions: Vec<Transaction>,
}

impl TransactionSet {
    pub fn new(name: &str, columns: &[CanonicalColumn], transactions: Vec<Transaction>) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.to_vec(),
            transactions,
        }
    }

    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.columns.contains(&column)
    }

    pub fn missing_columns(&self, required: &[CanonicalColumn]) -> Vec<CanonicalColumn> {
        required
            .iter()
            .filter(|c| !self.has_column(**c))
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Which join key produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    PostDate,
    TransactionDate,
    Unmatched,
}

impl MatchTier {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::PostDate => "P",
            Self::TransactionDate => "T",
            Self::Unmatched => "U",
        }
    }

    /// `P:2025-01-01_-50.0`
    pub fn key(&self, date: Option<NaiveDate>, amount: Decimal) -> String {
        format!("{}:{}_{}", self.prefix(), iso_date(date), key_amount(amount))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Matched,
    UnmatchedDetail,
    UnmatchedAggregator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRecord {
    pub date: Option<NaiveDate>,
    pub year_month: String,
    pub account: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    pub amount: Decimal,
    pub reconciled_key: String,
    pub matched: bool,
    pub origin: Origin,
    pub source_file: String,
}

impl ReconciledRecord {
    pub fn tier(&self) -> MatchTier {
        match self.reconciled_key.split(':').next() {
            Some("P") => MatchTier::PostDate,
            Some("T") => MatchTier::TransactionDate,
            _ => MatchTier::Unmatched,
        }
    }
}

pub fn year_month(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m").to_string()).unwrap_or_default()
}
