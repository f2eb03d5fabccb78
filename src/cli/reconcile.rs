use std::path::PathBuf;

use colored::Colorize;

use crate::error::{ReconcileError, Result};
use crate::export::write_outputs;
use crate::importer::{import_aggregator, import_folder};
use crate::reconciler;
use crate::reports::{format_summary, generate_report};
use crate::settings::{shellexpand_path, RunContext, Settings};

fn resolve(flag: Option<&str>, fallback: Option<&str>, name: &str) -> Result<PathBuf> {
    flag.or(fallback)
        .map(shellexpand_path)
        .ok_or_else(|| {
            ReconcileError::Other(format!(
                "--{name} is required (or set it in the settings file)"
            ))
        })
}

pub fn run(
    ctx: &RunContext,
    settings: &Settings,
    aggregator: Option<&str>,
    details: Option<&str>,
) -> Result<()> {
    let aggregator_path = resolve(aggregator, settings.aggregator.as_deref(), "aggregator")?;
    let details_path = resolve(details, settings.details_dir.as_deref(), "details")?;

    let ledger = import_aggregator(&aggregator_path)?;
    let folder = import_folder(&details_path)?;

    for skipped in &folder.skipped {
        eprintln!("{} {}: {}", "Skipped".yellow(), skipped.file, skipped.reason);
    }
    println!(
        "{} aggregator rows, {} detail rows from {} file(s)",
        ledger.set.len(),
        folder.row_count(),
        folder.files.len()
    );

    let details = folder.merged(&details_path.display().to_string());
    let reconciliation = reconciler::reconcile(&ledger.set, &[details])?;
    let report = generate_report(&reconciliation);
    let paths = write_outputs(ctx, &reconciliation, &report)?;

    println!("{}", format_summary(&report));
    println!("Reconciled: {}", paths.reconciled.display());
    println!("Unmatched:  {}", paths.unmatched.display());
    println!("Summary:    {}", paths.summary.display());
    Ok(())
}
