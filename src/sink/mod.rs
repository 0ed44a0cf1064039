// src/sink/mod.rs

pub mod sheets;
pub mod xlsx;

pub use sheets::{append_unique, has_row, AppendOutcome, GoogleSheetsClient, SheetStore};
pub use xlsx::write_report;
