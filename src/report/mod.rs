// src/report/mod.rs

use crate::table::{Cell, Table};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

pub mod answers;
pub mod breakdown;
pub mod groups;
pub mod work_time;

/// Message row written instead of an empty matrix.
pub fn no_calls_message(date: &str) -> String {
    format!("За {date} не было звонков")
}

/// Rows ready for a sink plus the few formatting decisions a report makes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReportTable {
    pub rows: Vec<Vec<Cell>>,
    /// Leading rows that are headings rather than data.
    pub header_rows: usize,
    /// Fill color (0xRRGGBB) of the heading cells right of column A.
    pub header_fill: Option<u32>,
    /// Zero-based columns rendered as `0.00%`.
    pub percent_columns: Vec<usize>,
    /// Width per column, starting at column A.
    pub column_widths: Vec<f64>,
    /// Center and wrap every cell.
    pub centered: bool,
}

impl ReportTable {
    pub fn message(text: String) -> Self {
        Self {
            rows: vec![vec![Cell::Text(text)]],
            ..Self::default()
        }
    }

    /// Header row followed by the table's rows, no extra styling.
    pub fn from_table(table: &Table) -> Self {
        let mut rows = Vec::with_capacity(table.len() + 1);
        rows.push(table.headers().iter().map(|h| Cell::text(h.clone())).collect());
        rows.extend(table.rows().iter().cloned());
        Self {
            rows,
            header_rows: 1,
            ..Self::default()
        }
    }

    pub fn is_percent_column(&self, col: usize) -> bool {
        self.percent_columns.contains(&col)
    }
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `<dir>/report_<kind>_<part>_…_<YYYY-MM-DD_HH-MM-SS>.xlsx`; empty parts are skipped.
pub fn report_path(dir: &Path, kind: &str, parts: &[&str], now: NaiveDateTime) -> PathBuf {
    let mut name = format!("report_{kind}");
    for part in parts.iter().filter(|p| !p.is_empty()) {
        name.push('_');
        name.push_str(part);
    }
    name.push_str(&now.format("_%Y-%m-%d_%H-%M-%S.xlsx").to_string());
    dir.join(name)
}
