// src/period.rs

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc, Weekday};
use std::io::{self, BufRead, Write};

/// Reports are cut by Moscow civil days.
const MSK_OFFSET_SECS: i32 = 3 * 3600;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

fn msk() -> FixedOffset {
    FixedOffset::east_opt(MSK_OFFSET_SECS).expect("UTC+3 is a valid offset")
}

/// The civil date before `now`'s date in UTC+3.
pub fn yesterday_in_msk(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&msk()).date_naive() - Duration::days(1)
}

/// Days a scheduled run has to cover. Nobody runs the reports on Saturday and
/// Sunday, so the Monday run also produces Friday and Saturday.
pub fn catch_up_dates(yesterday: NaiveDate) -> Vec<NaiveDate> {
    if yesterday.weekday() == Weekday::Sun {
        (0..=2).rev().map(|back| yesterday - Duration::days(back)).collect()
    } else {
        vec![yesterday]
    }
}

/// Label of the daily counter for `date`, e.g. `9 сентября`.
pub fn counter_label(date: NaiveDate) -> String {
    format!("{} {}", date.day(), MONTHS_GENITIVE[date.month0() as usize])
}

/// Date as written in the first column of the cloud sheet, e.g. `9 сентября 2025 г.`.
pub fn sheet_date_label(date: NaiveDate) -> String {
    format!("{} {} г.", counter_label(date), date.year())
}

/// One reporting period as the remote API expects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub from: String,
    pub to: String,
}

impl Period {
    pub fn day(date: NaiveDate) -> Self {
        let s = date.format(DATE_FORMAT).to_string();
        Self {
            from: s.clone(),
            to: s,
        }
    }

    /// Calendar date the period starts on; typed-in periods may carry a time part.
    pub fn date(&self) -> Result<NaiveDate> {
        parse_head(&self.from)
    }

    /// The one day this period covers; a range spanning several days is an error.
    pub fn single_date(&self) -> Result<NaiveDate> {
        let (from, to) = (parse_head(&self.from)?, parse_head(&self.to)?);
        if from != to {
            return Err(Error::MultiDayPeriod {
                from: self.from.clone(),
                to: self.to.clone(),
            });
        }
        Ok(from)
    }
}

fn parse_head(typed: &str) -> Result<NaiveDate> {
    let head = typed.trim().get(..10).unwrap_or(typed.trim());
    NaiveDate::parse_from_str(head, DATE_FORMAT).map_err(|_| Error::InvalidDate(typed.to_string()))
}

/// Line-based question/answer source, so resolution can be tested without a terminal.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> Result<String>;
}

pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{question}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// A positional parameter and the question asked for it in interactive mode.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub question: &'static str,
}

pub const TOKEN: Param = Param {
    name: "token",
    question: "Введите ваш токен: ",
};

pub const PROJECT_ID: Param = Param {
    name: "project_id",
    question: "Введите ID проекта: ",
};

pub const COUNTERS_URL: Param = Param {
    name: "counters_url",
    question: "Введите адрес страницы со счётчиками: ",
};

/// Command-line contract of one automation.
#[derive(Debug, Clone, Copy)]
pub struct ArgsSpec {
    pub params: &'static [Param],
    /// Whether interactive mode asks for a date range.
    pub takes_period: bool,
    pub usage: &'static str,
}

/// Where the period came from decides how many runs there are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Positional arguments: report on yesterday (and catch up after a weekend).
    Yesterday(NaiveDate),
    /// Interactive: whatever the operator typed, one run.
    Typed(Period),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Parameter values in `ArgsSpec::params` order.
    pub values: Vec<String>,
    pub schedule: Schedule,
}

impl Invocation {
    pub fn value(&self, name: &str, spec: &ArgsSpec) -> Option<&str> {
        spec.params
            .iter()
            .position(|p| p.name == name)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn periods(&self) -> Vec<Period> {
        match &self.schedule {
            Schedule::Yesterday(d) => catch_up_dates(*d).into_iter().map(Period::day).collect(),
            Schedule::Typed(p) => vec![p.clone()],
        }
    }
}

/// Turn process arguments (without the program name) into an invocation.
pub fn resolve(
    args: &[String],
    spec: &ArgsSpec,
    prompt: &mut dyn Prompt,
    yesterday: NaiveDate,
) -> Result<Invocation> {
    if !args.is_empty() && args.len() == spec.params.len() {
        return Ok(Invocation {
            values: args.to_vec(),
            schedule: Schedule::Yesterday(yesterday),
        });
    }
    if !args.is_empty() {
        return Err(Error::Usage(spec.usage.to_string()));
    }

    let mut values = Vec::with_capacity(spec.params.len());
    for param in spec.params {
        values.push(prompt.ask(param.question)?);
    }
    let schedule = if spec.takes_period {
        let from = prompt.ask("Введите начало периода в формате YYYY-MM-DD hh:mm:ss: ")?;
        let to = prompt.ask("Введите конец периода в формате YYYY-MM-DD hh:mm:ss: ")?;
        Schedule::Typed(Period { from, to })
    } else {
        Schedule::Yesterday(yesterday)
    };
    Ok(Invocation { values, schedule })
}

/// `resolve` over this process's arguments and stdin, with yesterday taken
/// from the system clock.
pub fn from_process_args(spec: &ArgsSpec) -> Result<Invocation> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    resolve(&args, spec, &mut StdinPrompt, yesterday_in_msk(Utc::now()))
}
