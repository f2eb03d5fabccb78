use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ReconcileError, Result};
use crate::fmt::{iso_date, plain_amount};
use crate::models::ReconciledRecord;
use crate::reconciler::Reconciliation;
use crate::reports::ReconciliationReport;
use crate::settings::RunContext;

pub const RECONCILED_HEADER: [&str; 9] = [
    "Date",
    "YearMonth",
    "Account",
    "Description",
    "Category",
    "Tags",
    "Amount",
    "ReconciledKey",
    "Matched",
];

/// Write records as CSV with LF line endings.
pub fn write_records<'a, W: Write>(
    records: impl IntoIterator<Item = &'a ReconciledRecord>,
    writer: W,
) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    csv.write_record(RECONCILED_HEADER)?;
    for r in records {
        let date = iso_date(r.date);
        let amount = plain_amount(r.amount);
        csv.write_record([
            date.as_str(),
            r.year_month.as_str(),
            r.account.as_str(),
            r.description.as_str(),
            r.category.as_str(),
            r.tags.as_str(),
            amount.as_str(),
            r.reconciled_key.as_str(),
            if r.matched { "true" } else { "false" },
        ])?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_reconciled(path: &Path, records: &[ReconciledRecord]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_records(records, std::io::BufWriter::new(file))?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub reconciled: PathBuf,
    pub unmatched: PathBuf,
    pub summary: PathBuf,
}

/// Write the full set, the unmatched subset and the JSON report under the
/// context's output directory.
pub fn write_outputs(
    ctx: &RunContext,
    reconciliation: &Reconciliation,
    report: &ReconciliationReport,
) -> Result<OutputPaths> {
    if reconciliation.is_empty() {
        return Err(ReconcileError::Other(
            "No transactions to write: both inputs were empty".to_string(),
        ));
    }
    ctx.ensure_dirs()?;

    let paths = OutputPaths {
        reconciled: ctx.reconciled_dir().join("all_transactions.csv"),
        unmatched: ctx.unmatched_dir().join("unmatched_transactions.csv"),
        summary: ctx.output_dir.join("summary.json"),
    };

    write_reconciled(&paths.reconciled, reconciliation.records())?;

    let unmatched: Vec<ReconciledRecord> = reconciliation
        .records()
        .iter()
        .filter(|r| !r.matched)
        .cloned()
        .collect();
    write_reconciled(&paths.unmatched, &unmatched)?;

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&paths.summary, format!("{json}\n"))?;
    tracing::info!("Wrote summary to {}", paths.summary.display());

    Ok(paths)
}
