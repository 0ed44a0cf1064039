// src/error.rs

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can stop a report run.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong number of command-line arguments; carries the usage text.
    #[error("{0}")]
    Usage(String),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("sheet has no header row after skipping {skipped} rows")]
    MissingHeader { skipped: usize },

    #[error("column `{0}` not found")]
    MissingColumn(String),

    #[error("column `{column}` row {row}: `{value}` is not a number")]
    InvalidNumber {
        column: String,
        row: usize,
        value: String,
    },

    /// Nothing was worked on the day, so per-hour ratios are undefined.
    #[error("no worked time recorded for {0}")]
    InsufficientData(String),

    #[error("counter `{0}` not found on the counters page")]
    CounterMissing(String),

    #[error("counter `{name}` has a non-numeric value `{value}`")]
    CounterValue { name: String, value: String },

    #[error("row has {0} cells, only 26 columns (A:Z) are supported")]
    RowTooWide(usize),

    #[error("invalid date `{0}`")]
    InvalidDate(String),

    #[error("the period {from} .. {to} spans several days; this report covers one day")]
    MultiDayPeriod { from: String, to: String },

    #[error("no file with `{pattern}` in its name under {dir}")]
    InputNotFound { pattern: String, dir: String },

    #[error("unknown time difference `{0}`")]
    UnknownTimeZone(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error("reading workbook: {0}")]
    Workbook(String),

    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }
}
