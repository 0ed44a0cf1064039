// src/table.rs

use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;

/// A single spreadsheet cell, as far as the reports care.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Text cell; blank strings become `Empty`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric value, parsing text cells such as `"12,5"` or `" 7 "`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().replace(',', ".").parse().ok(),
            Cell::Empty => None,
        }
    }

    /// JSON value for the Sheets API: numbers stay numbers, everything else is a string.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(self.to_string())),
            _ => Value::String(self.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            // phone numbers and ids come back from xlsx as floats
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::text(s)
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as f64)
    }
}

impl From<u64> for Cell {
    fn from(n: u64) -> Self {
        Cell::Number(n as f64)
    }
}

/// How many rows around the real data a sheet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SheetLayout {
    /// Title/metadata rows before the header row.
    pub leading_rows: usize,
    /// Summary rows after the last data row.
    pub trailing_rows: usize,
}

/// Untyped rows exactly as the remote client delivered them. The header is
/// still somewhere in `rows`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Strip the layout's leading rows, promote the next row to the header and
    /// drop the trailing summary rows. Data rows are padded or cut to the header width.
    pub fn into_table(self, layout: SheetLayout) -> Result<Table> {
        let mut rows = self.rows.into_iter().skip(layout.leading_rows);
        let header = rows.next().ok_or(Error::MissingHeader {
            skipped: layout.leading_rows,
        })?;
        let headers: Vec<String> = header.iter().map(|c| c.to_string().trim().to_string()).collect();

        let mut data: Vec<Vec<Cell>> = rows.collect();
        data.truncate(data.len().saturating_sub(layout.trailing_rows));
        for row in &mut data {
            row.resize(headers.len(), Cell::Empty);
        }

        Ok(Table {
            headers,
            rows: data,
        })
    }
}

/// A header plus rows of the same width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<Cell>>) -> Self {
        for row in &mut rows {
            row.resize(headers.len(), Cell::Empty);
        }
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Cell> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Distinct non-empty values of `name`, in order of first appearance.
    pub fn distinct(&self, name: &str) -> Result<Vec<String>> {
        let mut seen = Vec::new();
        for cell in self.column(name)? {
            if cell.is_empty() {
                continue;
            }
            let value = cell.to_string();
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        Ok(seen)
    }

    /// Keep only rows whose `column` contains `needle`. Empty cells never match.
    pub fn retain_containing(&mut self, column: &str, needle: &str) -> Result<()> {
        let idx = self.column_index(column)?;
        self.rows.retain(|r| match &r[idx] {
            Cell::Empty => false,
            cell => cell.to_string().contains(needle),
        });
        Ok(())
    }

    /// Rename headers; sources that are not present are ignored.
    pub fn rename<S: AsRef<str>>(&mut self, map: &[(S, S)]) {
        for header in &mut self.headers {
            if let Some((_, to)) = map.iter().find(|(from, _)| from.as_ref() == header) {
                *header = to.as_ref().to_string();
            }
        }
    }

    /// Project onto `columns`, in that order.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Result<Table> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let rows = self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Ok(Table {
            headers: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        })
    }

    /// Apply `f` to every numeric value of `column`. Empty cells are left alone.
    pub fn map_numeric(&mut self, column: &str, f: impl Fn(f64) -> f64) -> Result<()> {
        let idx = self.column_index(column)?;
        for (row_no, row) in self.rows.iter_mut().enumerate() {
            let cell = &mut row[idx];
            if cell.is_empty() {
                continue;
            }
            let value = cell.as_f64().ok_or_else(|| Error::InvalidNumber {
                column: column.to_string(),
                row: row_no,
                value: cell.to_string(),
            })?;
            *cell = Cell::Number(f(value));
        }
        Ok(())
    }

    /// Numeric value at (`row`, `column`); empty cells count as zero.
    pub fn number(&self, row: usize, column: &str) -> Result<f64> {
        let idx = self.column_index(column)?;
        let cell = &self.rows[row][idx];
        if cell.is_empty() {
            return Ok(0.0);
        }
        cell.as_f64().ok_or_else(|| Error::InvalidNumber {
            column: column.to_string(),
            row,
            value: cell.to_string(),
        })
    }
}
