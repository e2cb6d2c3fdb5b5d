use tracing::info;

use crate::domain::{CleanedTable, Column};
use crate::observability::metrics::output as output_metrics;

/// Columns with no missing value in any row, in schema order
pub fn complete_columns(table: &CleanedTable) -> Vec<Column> {
    table
        .columns
        .iter()
        .copied()
        .filter(|&column| !table.records.iter().any(|r| r.is_missing(column)))
        .collect()
}

/// Drop every column that is missing a value in even one row.
///
/// This is a whole-column decision, never a per-row one: rows are untouched,
/// only the set of columns the table will be written with shrinks.
pub fn drop_incomplete_columns(mut table: CleanedTable) -> CleanedTable {
    let keep = complete_columns(&table);
    let dropped: Vec<&'static str> = table
        .columns
        .iter()
        .filter(|c| !keep.contains(c))
        .map(Column::as_str)
        .collect();

    output_metrics::columns_dropped(dropped.len());
    if !dropped.is_empty() {
        info!("Dropping columns with missing values: {}", dropped.join(", "));
    }

    table.columns = keep;
    table
}
