use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{ReconcileError, Result};
use crate::formats::{detect_format, FormatKind, Header, DETAIL_COLUMNS};
use crate::models::{CanonicalColumn, Transaction, TransactionSet};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

fn is_csv(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

// ---------------------------------------------------------------------------
// Single file
// ---------------------------------------------------------------------------

pub struct ImportedFile {
    pub format: FormatKind,
    pub set: TransactionSet,
    /// Fields that failed to parse and were replaced by a null date or zero.
    pub degraded: usize,
    /// CSV records that could not be read at all.
    pub unreadable: usize,
}

impl ImportedFile {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            file: self.set.name.clone(),
            format: self.format,
            rows: self.set.len(),
            degraded: self.degraded,
            unreadable: self.unreadable,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub file: String,
    pub format: FormatKind,
    pub rows: usize,
    pub degraded: usize,
    pub unreadable: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} rows as {}", self.file, self.rows, self.format.name())?;
        if self.degraded > 0 {
            write!(f, ", {} degraded field(s)", self.degraded)?;
        }
        if self.unreadable > 0 {
            write!(f, ", {} unreadable record(s)", self.unreadable)?;
        }
        Ok(())
    }
}

/// Detect the layout of a CSV stream and normalize every row.
pub fn import_reader<R: Read>(reader: R, source_file: &str) -> Result<ImportedFile> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let header = Header::new(rdr.headers()?.iter());
    let format = detect_format(&header).ok_or_else(|| {
        ReconcileError::UnrecognizedFormat(format!(
            "{source_file} (columns: {})",
            header.columns().join(", ")
        ))
    })?;

    let mut transactions = Vec::new();
    let mut degraded = 0usize;
    let mut unreadable = 0usize;
    for (i, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("{source_file}: skipping record {}: {e}", i + 1);
                unreadable += 1;
                continue;
            }
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let normalized = format.normalize(&header.row(&record), source_file);
        degraded += normalized.degraded;
        transactions.push(normalized.transaction);
    }

    if degraded > 0 {
        tracing::warn!("{source_file}: {degraded} field(s) could not be parsed and were degraded");
    }

    Ok(ImportedFile {
        format,
        set: TransactionSet::new(source_file, format.columns(), transactions),
        degraded,
        unreadable,
    })
}

pub fn import_file(file_path: &Path) -> Result<ImportedFile> {
    if !file_path.is_file() {
        return Err(ReconcileError::InputNotFound(file_path.to_path_buf()));
    }
    let file = std::fs::File::open(file_path)?;
    let imported = import_reader(std::io::BufReader::new(file), &file_name(file_path))?;
    tracing::info!("Imported {}", imported.summary());
    Ok(imported)
}

/// The aggregator export is mandatory: any failure here aborts the run.
pub fn import_aggregator(file_path: &Path) -> Result<ImportedFile> {
    let imported = import_file(file_path)?;
    if imported.set.is_empty() {
        tracing::warn!("{} has no transactions", file_path.display());
    }
    if !imported.format.is_aggregator() {
        tracing::warn!(
            "{} was detected as {}, not an aggregator ledger",
            file_path.display(),
            imported.format.name()
        );
    }
    Ok(imported)
}

// ---------------------------------------------------------------------------
// Folder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

pub struct FolderImport {
    /// Sorted by file name.
    pub files: Vec<ImportedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl FolderImport {
    /// All detail rows concatenated in file-name order, as one set sourcing
    /// only the canonical columns every file provides.
    pub fn merged(self, name: &str) -> TransactionSet {
        let columns: Vec<CanonicalColumn> = match self.files.first() {
            Some(first) => first
                .set
                .columns
                .iter()
                .copied()
                .filter(|c| self.files.iter().all(|f| f.set.has_column(*c)))
                .collect(),
            None => DETAIL_COLUMNS.to_vec(),
        };
        let transactions: Vec<Transaction> = self
            .files
            .into_iter()
            .flat_map(|f| f.set.transactions)
            .collect();
        TransactionSet::new(name, &columns, transactions)
    }

    pub fn row_count(&self) -> usize {
        self.files.iter().map(|f| f.set.len()).sum()
    }
}

/// Import every `*.csv` in `dir`. Files are processed in parallel; a file
/// that fails or is not a detail export is skipped without affecting the
/// others.
pub fn import_folder(dir: &Path) -> Result<FolderImport> {
    if !dir.is_dir() {
        return Err(ReconcileError::InputNotFound(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_csv(p))
        .collect();
    paths.sort_by_key(|p| file_name(p));

    // Indexed collect keeps the sorted order.
    let results: Vec<(String, Result<ImportedFile>)> = paths
        .par_iter()
        .map(|p| (file_name(p), import_file(p)))
        .collect();

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for (name, result) in results {
        match result {
            Ok(imported) if imported.format.is_aggregator() => {
                tracing::warn!("Skipping {name}: aggregator ledger found among detail files");
                skipped.push(SkippedFile {
                    file: name,
                    reason: "aggregator ledger, not a detail export".to_string(),
                });
            }
            Ok(imported) => files.push(imported),
            Err(e) => {
                tracing::warn!("Skipping {name}: {e}");
                skipped.push(SkippedFile {
                    file: name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if files.is_empty() {
        tracing::warn!("No usable detail files in {}", dir.display());
    }

    Ok(FolderImport { files, skipped })
}
