// src/report/work_time.rs

use super::{round2, ReportTable};
use crate::error::{Error, Result};
use crate::schema::columns::*;
use crate::table::{Cell, Table};
use std::collections::HashSet;
use tracing::debug;

/// Every call is billed three seconds of wrap-up on top of the measured states.
const WRAP_UP_PER_CALL: f64 = 3.0;

/// One operator's day on one project, durations in hours.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkTimeRow {
    pub project: String,
    pub operator: String,
    pub ready: f64,
    pub talk: f64,
    pub callback: f64,
    /// Call count, already divided by 3600 like the durations.
    pub calls: f64,
    pub total: f64,
    pub successful: f64,
}

impl WorkTimeRow {
    /// Ready + talk + callback + wrap-up, never more than the reported total.
    pub fn worked_hours(&self) -> f64 {
        let sum = self.ready + self.talk + self.callback + WRAP_UP_PER_CALL * self.calls;
        if sum > self.total {
            self.total
        } else {
            sum
        }
    }
}

/// Typed view over a reshaped work-time table.
pub fn rows_from_table(table: &Table) -> Result<Vec<WorkTimeRow>> {
    let project = table.column_index(PROJECT)?;
    let operator = table.column_index(OPERATOR)?;
    (0..table.len())
        .map(|i| {
            let row = &table.rows()[i];
            Ok(WorkTimeRow {
                project: row[project].to_string(),
                operator: row[operator].to_string(),
                ready: table.number(i, READY)?,
                talk: table.number(i, TALK)?,
                callback: table.number(i, CALLBACK)?,
                calls: table.number(i, CALLS)?,
                total: table.number(i, TOTAL)?,
                successful: table.number(i, SUCCESSFUL)?,
            })
        })
        .collect()
}

/// The daily figures of the work-time report.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkTimeSummary {
    /// Period as printed in the export's title row.
    pub period_label: String,
    pub operators: usize,
    pub worked_hours: f64,
    pub completes: u64,
    pub recruits: f64,
    pub completes_per_hour: f64,
    pub recruits_per_hour: f64,
    /// Project folders the day's work was spread over.
    pub folders: String,
}

/// Folder part of a project name: whatever follows `<year>` and one separator.
fn folder_name(project: &str, year: i32) -> String {
    let year = year.to_string();
    match project.find(&year) {
        Some(idx) => project[idx + year.len()..].chars().skip(1).collect(),
        None => project.to_string(),
    }
}

/// Aggregate one day. `completes` comes from the daily counters page.
pub fn summarize(
    period_label: &str,
    rows: &[WorkTimeRow],
    completes: u64,
    year: i32,
) -> Result<WorkTimeSummary> {
    let operators = rows
        .iter()
        .map(|r| r.operator.as_str())
        .filter(|o| !o.is_empty())
        .collect::<HashSet<_>>()
        .len();

    let worked_hours = round2(rows.iter().map(WorkTimeRow::worked_hours).sum());
    if worked_hours <= 0.0 {
        return Err(Error::InsufficientData(period_label.to_string()));
    }
    let recruits: f64 = rows.iter().map(|r| r.successful).sum();

    let mut folders: Vec<String> = Vec::new();
    for row in rows {
        let folder = folder_name(&row.project, year);
        if !folders.contains(&folder) {
            folders.push(folder);
        }
    }

    debug!(operators, worked_hours, completes, recruits, "work time summarized");
    Ok(WorkTimeSummary {
        period_label: period_label.to_string(),
        operators,
        worked_hours,
        completes,
        recruits,
        completes_per_hour: round2(completes as f64 / worked_hours),
        recruits_per_hour: round2(recruits / worked_hours),
        folders: folders.join(", "),
    })
}

const HEADINGS: [&str; 8] = [
    "Период",
    "Операторов",
    "Рабочее время, ч",
    "Анкет",
    "Рекрутов",
    "Анкет в час",
    "Рекрутов в час",
    "Папки",
];

impl WorkTimeSummary {
    fn cells(&self, first: &str) -> Vec<Cell> {
        vec![
            Cell::text(first),
            Cell::from(self.operators),
            Cell::Number(self.worked_hours),
            Cell::from(self.completes),
            Cell::Number(self.recruits),
            Cell::Number(self.completes_per_hour),
            Cell::Number(self.recruits_per_hour),
            Cell::text(self.folders.clone()),
        ]
    }

    pub fn to_report(&self) -> ReportTable {
        ReportTable {
            rows: vec![
                HEADINGS.iter().map(|h| Cell::from(*h)).collect(),
                self.cells(&self.period_label),
            ],
            header_rows: 1,
            column_widths: vec![25.0, 12.0, 16.0, 10.0, 10.0, 12.0, 14.0, 40.0],
            ..ReportTable::default()
        }
    }

    /// Row appended to the cloud sheet; the first cell is the date label.
    pub fn to_sheet_row(&self, date_label: &str) -> Vec<Cell> {
        self.cells(date_label)
    }
}
