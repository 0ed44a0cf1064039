// src/tasks/work_time.rs

use super::stamp;
use crate::error::{Error, Result};
use crate::fetch::counters::parse_count;
use crate::fetch::{CounterSource, SurveySource};
use crate::period::{counter_label, sheet_date_label, Period};
use crate::report::report_path;
use crate::report::work_time::{rows_from_table, summarize, WorkTimeSummary};
use crate::schema::Registry;
use crate::sink::{append_unique, has_row, write_report, AppendOutcome, SheetStore};
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the daily row goes besides the local workbook.
pub struct CloudSheet<'a> {
    pub store: &'a dyn SheetStore,
    pub sheet: &'a str,
}

pub struct WorkTimeTask<'a> {
    pub source: &'a dyn SurveySource,
    pub counters: &'a dyn CounterSource,
    pub registry: &'a Registry,
    pub reports_dir: &'a Path,
    pub cloud: Option<CloudSheet<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkTimeOutcome {
    Saved {
        summary: WorkTimeSummary,
        path: PathBuf,
        /// `None` when no cloud sheet is configured.
        sheet: Option<AppendOutcome>,
    },
    /// The cloud sheet already has a row for the day; nothing was fetched or written.
    AlreadyPresent { label: String },
    /// Nobody worked on the project that day; nothing was written.
    NoWork { period_label: String },
}

/// Completed interviews of `date` according to the public counters page.
pub fn completes_on(counters: &dyn CounterSource, date: NaiveDate) -> Result<u64> {
    let label = counter_label(date);
    let value = counters
        .counter_value(&label)?
        .ok_or_else(|| Error::CounterMissing(label.clone()))?;
    parse_count(&label, &value)
}

impl WorkTimeTask<'_> {
    pub fn run(&self, period: &Period) -> Result<WorkTimeOutcome> {
        let date = period.single_date()?;
        let label = sheet_date_label(date);
        if let Some(cloud) = &self.cloud {
            if has_row(cloud.store, cloud.sheet, &label)? {
                info!(%label, sheet = cloud.sheet, "day already in the cloud sheet, nothing to do");
                return Ok(WorkTimeOutcome::AlreadyPresent { label });
            }
        }

        let completes = completes_on(self.counters, date)?;

        let raw = self.source.operator_work_time(period)?;
        let period_label = raw
            .cell(0, 1)
            .map(ToString::to_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| period.from.clone());
        let table = self.registry.work_time.reshape(raw)?;
        let rows = rows_from_table(&table)?;
        let summary = match summarize(&period_label, &rows, completes, date.year()) {
            Err(Error::InsufficientData(period_label)) => {
                warn!(%period_label, "no worked time recorded, day skipped");
                return Ok(WorkTimeOutcome::NoWork { period_label });
            }
            other => other?,
        };

        let path = report_path(
            self.reports_dir,
            &self.registry.work_time.kind,
            &[&period.from],
            stamp(),
        );
        write_report(&summary.to_report(), &path)?;
        info!(path = %path.display(), "work-time report saved");

        let sheet = match &self.cloud {
            Some(cloud) => {
                let row = summary.to_sheet_row(&label);
                Some(append_unique(cloud.store, cloud.sheet, &row)?)
            }
            None => {
                warn!("no cloud sheet configured, daily row not appended");
                None
            }
        };

        Ok(WorkTimeOutcome::Saved {
            summary,
            path,
            sheet,
        })
    }
}
