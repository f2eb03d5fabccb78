use std::path::PathBuf;

use crate::error::Result;
use crate::importer::import_file;

pub fn run(file: &str) -> Result<()> {
    let imported = import_file(&PathBuf::from(file))?;
    let summary = imported.summary();
    println!("{} ({})", summary.format.name(), summary.format.key());
    println!("{} rows", summary.rows);
    if summary.degraded > 0 {
        println!("{} field(s) could not be parsed", summary.degraded);
    }
    if summary.unreadable > 0 {
        println!("{} record(s) could not be read", summary.unreadable);
    }
    Ok(())
}
