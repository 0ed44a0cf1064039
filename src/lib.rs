pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod period;
pub mod prepare;
pub mod report;
pub mod schema;
pub mod sink;
pub mod table;
pub mod tasks;
pub mod workbook;

pub use error::{Error, Result};
