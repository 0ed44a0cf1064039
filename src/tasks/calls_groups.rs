// src/tasks/calls_groups.rs

use super::stamp;
use crate::error::Result;
use crate::fetch::SurveySource;
use crate::period::Period;
use crate::report::groups::{self, calls_from_table};
use crate::report::report_path;
use crate::schema::Registry;
use crate::sink::write_report;
use std::path::{Path, PathBuf};
use tracing::info;

/// Carrier-group pivot of one project's outgoing calls, saved as xlsx.
pub fn run(
    source: &dyn SurveySource,
    registry: &Registry,
    project_id: &str,
    period: &Period,
    reports_dir: &Path,
) -> Result<PathBuf> {
    let raw = source.outgoing_calls(project_id, period)?;
    let table = registry.calls_groups.reshape(raw)?;
    let calls = calls_from_table(&table)?;
    let report = groups::build(&calls, &period.from);

    let path = report_path(
        reports_dir,
        &registry.calls_groups.kind,
        &[&period.from, project_id],
        stamp(),
    );
    write_report(&report, &path)?;
    info!(calls = calls.len(), path = %path.display(), "calls groups report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::table::Cell;
    use crate::tasks::fakes::{sheet, FakeSource};
    use crate::workbook::sheet_from_file;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn day() -> Period {
        Period::day(NaiveDate::from_ymd_opt(2025, 9, 9).unwrap())
    }

    #[test]
    fn test_pivot_saved() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            outgoing: Some(sheet(vec![
                vec!["Регион оператора связи", "Оператор связи", "Результат"],
                vec!["Москва", "МТС", "Отказ"],
                vec!["Москва", "Билайн", "Отказ"],
            ])),
            ..FakeSource::default()
        };
        let path = run(&source, &Registry::new("x"), "55555", &day(), dir.path()).unwrap();
        let back = sheet_from_file(&path, None).unwrap();
        assert_eq!(back.cell(1, 1), Some(&Cell::from("Билайн")));
        assert_eq!(back.cell(1, 2), Some(&Cell::Number(50.0)));
        assert_eq!(back.cell(3, 1), Some(&Cell::from("Итог")));
        assert_eq!(back.cell(4, 0), Some(&Cell::from("Итог")));
    }

    #[test]
    fn test_export_without_carrier_columns_fails() {
        let dir = tempdir().unwrap();
        let source = FakeSource {
            outgoing: Some(sheet(vec![vec!["Результат", "Фактический канал"]])),
            ..FakeSource::default()
        };
        assert!(matches!(
            run(&source, &Registry::new("x"), "55555", &day(), dir.path()),
            Err(Error::MissingColumn(_))
        ));
    }
}
