// src/tasks/answers.rs

use super::stamp;
use crate::error::{Error, Result};
use crate::fetch::SurveySource;
use crate::report::answers::{self, COMPLETES_COUNTER};
use crate::report::report_path;
use crate::schema::Registry;
use crate::sink::write_report;
use std::path::{Path, PathBuf};
use tracing::info;

/// Answers of the fully interviewed respondents of `project_id`, reduced to
/// the project's export columns.
pub fn run(
    source: &dyn SurveySource,
    registry: &Registry,
    project_id: &str,
    reports_dir: &Path,
) -> Result<PathBuf> {
    let schema = registry.answers(project_id)?;
    let counter_id = source
        .counter_id_by_name(project_id, COMPLETES_COUNTER)?
        .ok_or_else(|| Error::CounterMissing(COMPLETES_COUNTER.to_string()))?;

    let raw = source.answers(project_id, &counter_id)?;
    let table = schema.reshape(raw)?;

    let path = report_path(reports_dir, &schema.kind, &[], stamp());
    write_report(&answers::build(&table), &path)?;
    info!(respondents = table.len(), path = %path.display(), "answers export saved");
    Ok(path)
}
