// src/tasks/mod.rs

use crate::error::Result;
use crate::period::{ArgsSpec, Period, COUNTERS_URL, PROJECT_ID, TOKEN};
use chrono::{Local, NaiveDateTime};
use std::thread;
use std::time::Duration;
use tracing::info;

pub mod answers;
pub mod calls_groups;
pub mod outgoing_calls;
pub mod work_time;

/// The API serves each export once per 60 seconds per token.
pub const CATCH_UP_PAUSE: Duration = Duration::from_secs(62);

/// Run `job` for every period in order, pausing between runs. The first
/// failure stops the remaining runs.
pub fn run_catch_up<T>(
    periods: &[Period],
    pause: Duration,
    mut job: impl FnMut(&Period) -> Result<T>,
) -> Result<Vec<T>> {
    let mut done = Vec::with_capacity(periods.len());
    for (i, period) in periods.iter().enumerate() {
        info!(from = %period.from, to = %period.to, "running report");
        done.push(job(period)?);
        if i + 1 < periods.len() && !pause.is_zero() {
            info!(
                secs = pause.as_secs(),
                "waiting: Survey Studio allows one export request per 60 seconds"
            );
            thread::sleep(pause);
        }
    }
    Ok(done)
}

/// Local wall-clock time used in report file names.
pub(crate) fn stamp() -> NaiveDateTime {
    Local::now().naive_local()
}

pub const WORK_TIME_ARGS: ArgsSpec = ArgsSpec {
    params: &[TOKEN, COUNTERS_URL],
    takes_period: true,
    usage: "Программу надо запускать одним из двух способов:

    1. С двумя параметрами - токен и адрес страницы со счётчиками; отчёт будет за вчерашний день:

        operator_work_time <token> <counters_url>

    2. Без параметров - программа спросит токен, адрес страницы и две даты:

        operator_work_time",
};

pub const OUTGOING_CALLS_ARGS: ArgsSpec = ArgsSpec {
    params: &[TOKEN, PROJECT_ID],
    takes_period: true,
    usage: "Программу надо запускать одним из двух способов:

    1. С двумя параметрами - токен и ID проекта; отчёт будет за вчерашний день:

        outgoing_calls <token> <project_id>

    2. Без параметров - программа спросит токен, ID проекта и две даты:

        outgoing_calls",
};

pub const CALLS_GROUPS_ARGS: ArgsSpec = ArgsSpec {
    params: &[TOKEN, PROJECT_ID],
    takes_period: true,
    usage: "Программу надо запускать одним из двух способов:

    1. С двумя параметрами - токен и ID проекта; отчёт будет за вчерашний день:

        calls_groups <token> <project_id>

    2. Без параметров - программа спросит токен, ID проекта и две даты:

        calls_groups",
};

pub const ANSWERS_ARGS: ArgsSpec = ArgsSpec {
    params: &[TOKEN, PROJECT_ID],
    takes_period: false,
    usage: "Нужно указать токен и ID проекта:

        export_answers <token> <project_id>",
};

pub const DAILY_COUNTER_ARGS: ArgsSpec = ArgsSpec {
    params: &[COUNTERS_URL],
    takes_period: false,
    usage: "Нужно указать адрес страницы со счётчиками:

        daily_counter <counters_url>",
};

#[cfg(test)]
pub(crate) mod fakes {
    use crate::error::{Error, Result};
    use crate::fetch::{CounterSource, SurveySource};
    use crate::period::Period;
    use crate::table::{Cell, RawSheet};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned exports keyed by endpoint; records every period asked for.
    #[derive(Default)]
    pub struct FakeSource {
        pub work_time: Option<RawSheet>,
        /// Work-time exports for specific start dates; others fall back to `work_time`.
        pub work_time_by_day: HashMap<String, RawSheet>,
        pub outgoing: Option<RawSheet>,
        pub answers: Option<RawSheet>,
        pub counters: HashMap<String, String>,
        pub asked: RefCell<Vec<Period>>,
    }

    fn canned(sheet: &Option<RawSheet>) -> Result<RawSheet> {
        sheet
            .clone()
            .ok_or_else(|| Error::Config("no canned export".into()))
    }

    impl SurveySource for FakeSource {
        fn operator_work_time(&self, period: &Period) -> Result<RawSheet> {
            self.asked.borrow_mut().push(period.clone());
            match self.work_time_by_day.get(&period.from) {
                Some(sheet) => Ok(sheet.clone()),
                None => canned(&self.work_time),
            }
        }

        fn outgoing_calls(&self, _project_id: &str, period: &Period) -> Result<RawSheet> {
            self.asked.borrow_mut().push(period.clone());
            canned(&self.outgoing)
        }

        fn counter_id_by_name(&self, _project_id: &str, name: &str) -> Result<Option<String>> {
            Ok(self.counters.get(name).cloned())
        }

        fn answers(&self, _project_id: &str, _counter_id: &str) -> Result<RawSheet> {
            canned(&self.answers)
        }
    }

    pub struct FakeCounters(pub HashMap<String, String>);

    impl CounterSource for FakeCounters {
        fn counter_value(&self, label: &str) -> Result<Option<String>> {
            Ok(self.0.get(label).cloned())
        }
    }

    pub fn sheet(rows: Vec<Vec<&str>>) -> RawSheet {
        RawSheet::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(Cell::from).collect())
                .collect(),
        )
    }
}
