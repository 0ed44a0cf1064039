// src/workbook.rs

use crate::error::{Error, Result};
use crate::table::{Cell, RawSheet};
use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;

fn workbook_err(e: impl std::fmt::Display) -> Error {
    Error::Workbook(e.to_string())
}

/// First worksheet of an in-memory `.xlsx`, as delivered by the API.
pub fn sheet_from_bytes(bytes: Vec<u8>) -> Result<RawSheet> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(workbook_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Workbook("workbook has no sheets".into()))?
        .map_err(workbook_err)?;
    Ok(sheet_from_range(&range))
}

/// A worksheet of an `.xlsx` on disk; the first one when `sheet` is `None`.
pub fn sheet_from_file(path: &Path, sheet: Option<&str>) -> Result<RawSheet> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| Error::Workbook(format!("{}: {e}", path.display())))?;
    let range = match sheet {
        Some(name) => workbook.worksheet_range(name),
        None => workbook.worksheet_range_at(0),
    }
    .ok_or_else(|| {
        Error::Workbook(format!(
            "{}: sheet {} not found",
            path.display(),
            sheet.unwrap_or("#0")
        ))
    })?
    .map_err(workbook_err)?;
    Ok(sheet_from_range(&range))
}

/// Keeps absolute positions: calamine ranges start at the first used cell,
/// but leading blank rows still count when the layout skips rows.
fn sheet_from_range(range: &Range<DataType>) -> RawSheet {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows = vec![Vec::new(); row_offset];
    for source in range.rows() {
        let mut row = vec![Cell::Empty; col_offset];
        row.extend(source.iter().map(cell_from));
        rows.push(row);
    }
    RawSheet::new(rows)
}

fn cell_from(value: &DataType) -> Cell {
    match value {
        DataType::Empty => Cell::Empty,
        DataType::String(s) => Cell::text(s.clone()),
        DataType::Float(f) | DataType::DateTime(f) => Cell::Number(*f),
        DataType::Int(i) => Cell::Number(*i as f64),
        DataType::Bool(b) => Cell::text(b.to_string()),
        other => Cell::text(format!("{other:?}")),
    }
}
