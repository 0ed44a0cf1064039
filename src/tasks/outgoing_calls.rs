// src/tasks/outgoing_calls.rs

use super::stamp;
use crate::error::Result;
use crate::fetch::SurveySource;
use crate::period::Period;
use crate::report::breakdown::{self, outcomes_from_table, RESULTS};
use crate::report::report_path;
use crate::schema::Registry;
use crate::sink::write_report;
use std::path::{Path, PathBuf};
use tracing::info;

/// Channel × result breakdown of one project's outgoing calls, saved as xlsx.
pub fn run(
    source: &dyn SurveySource,
    registry: &Registry,
    project_id: &str,
    period: &Period,
    reports_dir: &Path,
) -> Result<PathBuf> {
    let raw = source.outgoing_calls(project_id, period)?;
    let table = registry.outgoing_calls.reshape(raw)?;
    let outcomes = outcomes_from_table(&table)?;
    let report = breakdown::build(&outcomes, RESULTS, &period.from);

    let path = report_path(
        reports_dir,
        &registry.outgoing_calls.kind,
        &[&period.from, project_id],
        stamp(),
    );
    write_report(&report, &path)?;
    info!(calls = outcomes.len(), path = %path.display(), "outgoing calls report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use crate::tasks::fakes::{sheet, FakeSource};
    use crate::workbook::sheet_from_file;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    #[test]
    fn test_breakdown_file_is_named_after_day_and_project() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            outgoing: Some(sheet(vec![
                vec!["ID", "Результат", "Фактический канал"],
                vec!["1", "Занято", "CATI"],
                vec!["2", "Успешное интервью", ""],
            ])),
            ..FakeSource::default()
        };
        let registry = Registry::new("x");
        let day = Period::day(NaiveDate::from_ymd_opt(2025, 9, 9).unwrap());

        let path = run(&source, &registry, "55555", &day, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("report_outgoing_calls_2025-09-09_55555_"), "{name}");

        let back = sheet_from_file(&path, None).unwrap();
        assert_eq!(back.cell(0, 1), Some(&Cell::from("CATI")));
        assert_eq!(back.cell(0, 3), Some(&Cell::from("no_name")));
    }

    #[test]
    fn test_no_calls_writes_message() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            outgoing: Some(sheet(vec![vec!["Результат", "Фактический канал"]])),
            ..FakeSource::default()
        };
        let day = Period::day(NaiveDate::from_ymd_opt(2025, 9, 9).unwrap());
        let path = run(&source, &Registry::new("x"), "1", &day, dir.path()).unwrap();
        let back = sheet_from_file(&path, None).unwrap();
        assert_eq!(
            back.cell(0, 0),
            Some(&Cell::from("За 2025-09-09 не было звонков"))
        );
    }
}
