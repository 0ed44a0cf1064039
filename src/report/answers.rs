// src/report/answers.rs

use super::ReportTable;
use crate::table::Table;

/// Project counter whose respondents make up the export.
pub const COMPLETES_COUNTER: &str = "CAWI полные интервью";

/// Header plus rows, no index column; columns sized to their heading.
pub fn build(table: &Table) -> ReportTable {
    let mut report = ReportTable::from_table(table);
    report.column_widths = table
        .headers()
        .iter()
        .map(|h| (h.chars().count() as f64 + 2.0).clamp(8.0, 40.0))
        .collect();
    report
}
