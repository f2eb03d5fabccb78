use comfy_table::{Cell, Table};

use crate::error::{ReconcileError, Result};
use crate::formats::{get_by_key, FormatKind, DETECTION_ORDER};

pub fn run(key: Option<&str>) -> Result<()> {
    let selected: Vec<FormatKind> = match key {
        Some(k) => vec![get_by_key(k)
            .ok_or_else(|| ReconcileError::Other(format!("Unknown format key: {k}")))?],
        None => DETECTION_ORDER.to_vec(),
    };

    let mut table = Table::new();
    table.set_header(vec!["Key", "Name", "Required Columns", "Role"]);
    for format in selected {
        table.add_row(vec![
            Cell::new(format.key()),
            Cell::new(format.name()),
            Cell::new(format.signature().join(", ")),
            Cell::new(if format.is_aggregator() { "aggregator" } else { "detail" }),
        ]);
    }
    println!("Formats (checked in this order)\n{table}");
    Ok(())
}
