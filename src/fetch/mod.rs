// src/fetch/mod.rs

use crate::error::Result;
use crate::period::Period;
use crate::table::RawSheet;

pub mod counters;
pub mod survey_studio;

pub use counters::{CounterPage, CounterSource};
pub use survey_studio::SurveyStudioClient;

/// The Survey Studio endpoints the reports read from. Every call blocks and a
/// failure aborts the run; nothing is retried.
pub trait SurveySource {
    /// Operator work-time export; the header sits below two title rows.
    fn operator_work_time(&self, period: &Period) -> Result<RawSheet>;

    /// Outgoing call log of one project, header in the first row.
    fn outgoing_calls(&self, project_id: &str, period: &Period) -> Result<RawSheet>;

    /// Id of the project counter called `name`, if the project has one.
    fn counter_id_by_name(&self, project_id: &str, name: &str) -> Result<Option<String>>;

    /// Answers of the respondents counted by `counter_id`.
    fn answers(&self, project_id: &str, counter_id: &str) -> Result<RawSheet>;
}
