use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::fmt::{iso_date, money};
use crate::models::{MatchTier, Origin, ReconciledRecord};
use crate::reconciler::Reconciliation;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub matched: usize,
    pub post_date_matches: usize,
    pub transaction_date_matches: usize,
    pub unmatched_detail: usize,
    pub unmatched_aggregator: usize,
    /// matched / total, 0.0 for an empty run.
    pub match_rate: f64,
    pub total_amount: Decimal,
    pub matched_amount: Decimal,
    pub unmatched_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: String,
    pub year_month: String,
    pub account: String,
    pub description: String,
    pub category: String,
    pub tags: String,
    pub amount: Decimal,
    pub reconciled_key: String,
    pub source_file: String,
}

impl From<&ReconciledRecord> for ReportRow {
    fn from(r: &ReconciledRecord) -> Self {
        Self {
            date: iso_date(r.date),
            year_month: r.year_month.clone(),
            account: r.account.clone(),
            description: r.description.clone(),
            category: r.category.clone(),
            tags: r.tags.clone(),
            amount: r.amount,
            reconciled_key: r.reconciled_key.clone(),
            source_file: r.source_file.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub generated_at: String,
    pub summary: ReportSummary,
    pub matched: Vec<ReportRow>,
    pub unmatched_detail: Vec<ReportRow>,
    pub unmatched_aggregator: Vec<ReportRow>,
}

/// Saturates at `Decimal::MAX` rather than overflowing.
fn abs_total<'a>(records: impl Iterator<Item = &'a ReconciledRecord>) -> Decimal {
    records.fold(Decimal::ZERO, |total, r| total.saturating_add(r.amount.abs()))
}

fn rows(reconciliation: &Reconciliation, origin: Origin) -> Vec<ReportRow> {
    reconciliation.by_origin(origin).map(ReportRow::from).collect()
}

pub fn generate_report(reconciliation: &Reconciliation) -> ReconciliationReport {
    let matched = reconciliation.matched();
    let unmatched_detail = reconciliation.unmatched_detail();
    let unmatched_aggregator = reconciliation.unmatched_aggregator();
    let total = matched + unmatched_detail + unmatched_aggregator;
    let match_rate = if total == 0 {
        0.0
    } else {
        matched as f64 / total as f64
    };

    let records = reconciliation.records();
    let tier_count = |tier: MatchTier| records.iter().filter(|r| r.tier() == tier).count();
    let matched_amount = abs_total(records.iter().filter(|r| r.matched));
    let unmatched_amount = abs_total(records.iter().filter(|r| !r.matched));

    ReconciliationReport {
        generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        summary: ReportSummary {
            total,
            matched,
            post_date_matches: tier_count(MatchTier::PostDate),
            transaction_date_matches: tier_count(MatchTier::TransactionDate),
            unmatched_detail,
            unmatched_aggregator,
            match_rate,
            total_amount: matched_amount.saturating_add(unmatched_amount),
            matched_amount,
            unmatched_amount,
        },
        matched: rows(reconciliation, Origin::Matched),
        unmatched_detail: rows(reconciliation, Origin::UnmatchedDetail),
        unmatched_aggregator: rows(reconciliation, Origin::UnmatchedAggregator),
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

pub fn format_summary(report: &ReconciliationReport) -> String {
    let s = &report.summary;
    let mut table = Table::new();
    table.set_header(vec!["", "Count", "Amount"]);

    table.add_row(vec![
        Cell::new("Matched".green().bold()),
        Cell::new(s.matched),
        Cell::new(money(s.matched_amount)),
    ]);
    table.add_row(vec![
        Cell::new("  by post date"),
        Cell::new(s.post_date_matches),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("  by transaction date"),
        Cell::new(s.transaction_date_matches),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Unmatched (detail)".yellow()),
        Cell::new(s.unmatched_detail),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Unmatched (aggregator)".yellow()),
        Cell::new(s.unmatched_aggregator),
        Cell::new(""),
    ]);
    table.add_row(vec![
        Cell::new("Unmatched total".red().bold()),
        Cell::new(s.unmatched_detail + s.unmatched_aggregator),
        Cell::new(money(s.unmatched_amount)),
    ]);
    table.add_row(vec![Cell::new(""), Cell::new(""), Cell::new("")]);
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(s.total),
        Cell::new(money(s.total_amount)),
    ]);

    format!(
        "Reconciliation Summary\n{table}\nMatch rate: {:.1}%",
        s.match_rate * 100.0
    )
}
