// src/sink/sheets.rs

use crate::error::{Error, Result};
use crate::table::Cell;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};
use url::Url;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Row numbers of an A1 range such as `'Лист1'!A12:H12`.
static A1_ROWS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"![A-Z]+(\d+)(?::[A-Z]+(\d+))?$").expect("A1 regex should compile"));

/// The handful of spreadsheet operations the daily summary needs.
pub trait SheetStore {
    /// All non-empty rows of `sheet`, as displayed text.
    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<String>>>;

    /// Append `row` below the last row of `sheet`; returns the updated A1 range.
    fn append_row(&self, sheet: &str, row: &[Cell]) -> Result<String>;

    /// Numeric id of the tab called `sheet`.
    fn sheet_id(&self, sheet: &str) -> Result<i64>;

    fn batch_update(&self, requests: Vec<Request>) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended { range: String },
    /// A row for this date is already in the sheet; nothing was written.
    AlreadyPresent,
}

/// Column span covering `len` cells starting at A, e.g. `A:E`; an empty row
/// still addresses column A.
pub fn cells_range(len: usize) -> Result<String> {
    if len > 26 {
        return Err(Error::RowTooWide(len));
    }
    let last = (b'A' + len.saturating_sub(1) as u8) as char;
    Ok(format!("A:{last}"))
}

fn updated_rows(range: &str) -> Option<(u32, u32)> {
    let caps = A1_ROWS.captures(range)?;
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    let last = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => first,
    };
    Some((first, last))
}

/// Whether some row of `sheet` starts with `label` (compared trimmed).
pub fn has_row(store: &dyn SheetStore, sheet: &str, label: &str) -> Result<bool> {
    let existing = store.read_sheet(sheet)?;
    Ok(existing
        .iter()
        .any(|r| r.first().map(|c| c.trim()) == Some(label.trim())))
}

/// Append `row` unless a row with the same first cell (the date label) exists,
/// then outline the new row with solid borders.
pub fn append_unique(store: &dyn SheetStore, sheet: &str, row: &[Cell]) -> Result<AppendOutcome> {
    let label = row.first().map(Cell::to_string).unwrap_or_default();
    if has_row(store, sheet, &label)? {
        info!(sheet, label = %label, "row already present, not appending");
        return Ok(AppendOutcome::AlreadyPresent);
    }

    let range = store.append_row(sheet, row)?;
    let (first, last) = updated_rows(&range)
        .ok_or_else(|| Error::Config(format!("unexpected range `{range}` in append response")))?;
    let sheet_id = store.sheet_id(sheet)?;
    store.batch_update(vec![Request::outline(GridRange {
        sheet_id,
        start_row_index: first - 1,
        end_row_index: last,
        start_column_index: 0,
        end_column_index: row.len() as u32,
    })])?;

    info!(sheet, %range, "row appended");
    Ok(AppendOutcome::Appended { range })
}

// ─── batchUpdate requests ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    RepeatCell(RepeatCell),
}

impl Request {
    /// Solid border on every edge of every cell in `range`.
    pub fn outline(range: GridRange) -> Self {
        let solid = || Border {
            style: "SOLID".to_string(),
        };
        Request::RepeatCell(RepeatCell {
            range,
            cell: CellData {
                user_entered_format: CellFormat {
                    borders: Borders {
                        top: solid(),
                        bottom: solid(),
                        left: solid(),
                        right: solid(),
                    },
                },
            },
            fields: "userEnteredFormat(borders)".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatCell {
    pub range: GridRange,
    pub cell: CellData,
    pub fields: String,
}

/// Zero-based, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: u32,
    pub end_row_index: u32,
    pub start_column_index: u32,
    pub end_column_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_format: CellFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFormat {
    pub borders: Borders,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Borders {
    pub top: Border,
    pub bottom: Border,
    pub left: Border,
    pub right: Border,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Border {
    pub style: String,
}

// ─── Google Sheets v4 over REST ────────────────────────────────────────

/// OAuth client plus a long-lived refresh token.
#[derive(Debug, Clone)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: AppendUpdates,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: String,
}

#[derive(Deserialize)]
struct Spreadsheet {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

pub struct GoogleSheetsClient {
    http: Client,
    spreadsheet_id: String,
    access_token: String,
}

fn send(req: RequestBuilder, url: &str) -> Result<Response> {
    let resp = req.send().map_err(|e| Error::http(url, e))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status,
        });
    }
    Ok(resp)
}

fn json_body<T: DeserializeOwned>(resp: Response, url: &str) -> Result<T> {
    resp.json().map_err(|e| Error::http(url, e))
}

fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl GoogleSheetsClient {
    /// Exchange the refresh token for an access token and bind to one spreadsheet.
    #[instrument(level = "info", skip(credentials))]
    pub fn connect(credentials: &GoogleCredentials, spreadsheet_id: &str) -> Result<Self> {
        let http = Client::new();
        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("refresh_token", credentials.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let resp = send(http.post(TOKEN_URL).form(&form), TOKEN_URL)?;
        let token: TokenResponse = json_body(resp, TOKEN_URL)?;
        debug!("access token refreshed");
        Ok(Self {
            http,
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: token.access_token,
        })
    }

    /// `…/spreadsheets/<id>/<segments…>`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(SHEETS_URL).map_err(|e| Error::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{SHEETS_URL} cannot take path segments")))?
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    fn get<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        let req = self
            .http
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .query(query);
        json_body(send(req, url.as_str())?, url.as_str())
    }

    fn post<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)], body: &Value) -> Result<T> {
        let req = self
            .http
            .post(url.clone())
            .bearer_auth(&self.access_token)
            .query(query)
            .json(body);
        json_body(send(req, url.as_str())?, url.as_str())
    }
}

impl SheetStore for GoogleSheetsClient {
    fn read_sheet(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let url = self.url(&["values", sheet])?;
        let range: ValueRange = self.get(url, &[])?;
        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(display_text).collect())
            .collect())
    }

    #[instrument(level = "info", skip(self, row), fields(cells = row.len()))]
    fn append_row(&self, sheet: &str, row: &[Cell]) -> Result<String> {
        let range = format!("{sheet}!{}", cells_range(row.len())?);
        let url = self.url(&["values", &format!("{range}:append")])?;
        let body = json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": [row.iter().map(Cell::to_json).collect::<Vec<_>>()],
        });
        let resp: AppendResponse = self.post(url, &[("valueInputOption", "RAW")], &body)?;
        Ok(resp.updates.updated_range)
    }

    fn sheet_id(&self, sheet: &str) -> Result<i64> {
        let url = self.url(&[])?;
        let spreadsheet: Spreadsheet = self.get(url, &[("fields", "sheets.properties")])?;
        spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == sheet)
            .map(|p| p.sheet_id)
            .ok_or_else(|| Error::Config(format!("spreadsheet has no sheet `{sheet}`")))
    }

    fn batch_update(&self, requests: Vec<Request>) -> Result<()> {
        let mut url = self.url(&[])?;
        let batch = format!("{}:batchUpdate", self.spreadsheet_id);
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{SHEETS_URL} cannot take path segments")))?
            .pop()
            .push(&batch);
        let body = json!({ "requests": requests });
        let _: Value = self.post(url, &[], &body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemorySheet {
        rows: RefCell<Vec<Vec<String>>>,
        requests: RefCell<Vec<Request>>,
    }

    impl SheetStore for MemorySheet {
        fn read_sheet(&self, _sheet: &str) -> Result<Vec<Vec<String>>> {
            Ok(self.rows.borrow().clone())
        }

        fn append_row(&self, sheet: &str, row: &[Cell]) -> Result<String> {
            let mut rows = self.rows.borrow_mut();
            rows.push(row.iter().map(Cell::to_string).collect());
            let n = rows.len();
            let last = cells_range(row.len())?.chars().last().unwrap();
            Ok(format!("{sheet}!A{n}:{last}{n}"))
        }

        fn sheet_id(&self, _sheet: &str) -> Result<i64> {
            Ok(7)
        }

        fn batch_update(&self, requests: Vec<Request>) -> Result<()> {
            self.requests.borrow_mut().extend(requests);
            Ok(())
        }
    }

    fn summary_row(label: &str) -> Vec<Cell> {
        vec![
            Cell::from(label),
            Cell::from(12usize),
            Cell::Number(30.5),
            Cell::from(40u64),
            Cell::Number(11.0),
        ]
    }

    #[test]
    fn test_duplicate_guard_appends_once() {
        let store = MemorySheet::default();
        store.rows.borrow_mut().push(vec!["Дата".into()]);
        let row = summary_row("9 сентября 2025 г.");

        let first = append_unique(&store, "Лист1", &row).unwrap();
        assert_eq!(
            first,
            AppendOutcome::Appended {
                range: "Лист1!A2:E2".into()
            }
        );
        let second = append_unique(&store, "Лист1", &row).unwrap();
        assert_eq!(second, AppendOutcome::AlreadyPresent);
        assert_eq!(store.rows.borrow().len(), 2);
    }

    #[test]
    fn test_appended_row_is_outlined() {
        let store = MemorySheet::default();
        append_unique(&store, "Лист1", &summary_row("10 сентября 2025 г.")).unwrap();

        let requests = store.requests.borrow();
        let Request::RepeatCell(repeat) = &requests[0];
        assert_eq!(
            repeat.range,
            GridRange {
                sheet_id: 7,
                start_row_index: 0,
                end_row_index: 1,
                start_column_index: 0,
                end_column_index: 5,
            }
        );
        assert_eq!(repeat.fields, "userEnteredFormat(borders)");
    }

    #[test]
    fn test_outline_request_wire_shape() {
        let request = Request::outline(GridRange {
            sheet_id: 1,
            start_row_index: 4,
            end_row_index: 5,
            start_column_index: 0,
            end_column_index: 8,
        });
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(v["repeatCell"]["range"]["startRowIndex"], 4);
        assert_eq!(
            v["repeatCell"]["cell"]["userEnteredFormat"]["borders"]["top"]["style"],
            "SOLID"
        );
    }

    #[test]
    fn test_cells_range_limits() {
        assert_eq!(cells_range(5).unwrap(), "A:E");
        assert_eq!(cells_range(26).unwrap(), "A:Z");
        assert_eq!(cells_range(0).unwrap(), "A:A");
        assert!(matches!(cells_range(27), Err(Error::RowTooWide(27))));
    }

    #[test]
    fn test_updated_rows_parses_quoted_sheet() {
        assert_eq!(updated_rows("'Лист1'!A12:H12"), Some((12, 12)));
        assert_eq!(updated_rows("Лист1!A3"), Some((3, 3)));
        assert_eq!(updated_rows("garbage"), None);
    }
}
