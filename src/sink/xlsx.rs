// src/sink/xlsx.rs

use crate::error::Result;
use crate::report::ReportTable;
use crate::table::Cell;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook};
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

const PERCENT: &str = "0.00%";

fn cell_format(report: &ReportTable, row: usize, col: usize) -> Option<Format> {
    let heading = row < report.header_rows;
    // Column A holds row captions; only the headings right of it are styled.
    let styled_heading = heading && col > 0;
    let percent = !heading && report.is_percent_column(col);
    if !styled_heading && !percent && !report.centered {
        return None;
    }

    let mut format = Format::new();
    if styled_heading {
        format = format.set_bold();
        if let Some(rgb) = report.header_fill {
            format = format.set_background_color(Color::RGB(rgb));
        }
    }
    if percent {
        format = format.set_num_format(PERCENT);
    }
    if report.centered {
        format = format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap();
    }
    Some(format)
}

/// Write `report` as the only sheet of a new workbook at `path`, creating
/// the parent directory if needed.
#[instrument(level = "info", skip(report, path), fields(path = %path.display(), rows = report.rows.len()))]
pub fn write_report(report: &ReportTable, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, width) in report.column_widths.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }

    for (r, row) in report.rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r32, c16) = (r as u32, c as u16);
            match (cell, cell_format(report, r, c)) {
                (Cell::Empty, None) => {}
                (Cell::Empty, Some(f)) => {
                    sheet.write_blank(r32, c16, &f)?;
                }
                (Cell::Text(s), None) => {
                    sheet.write_string(r32, c16, s)?;
                }
                (Cell::Text(s), Some(f)) => {
                    sheet.write_string_with_format(r32, c16, s, &f)?;
                }
                (Cell::Number(n), None) => {
                    sheet.write_number(r32, c16, *n)?;
                }
                (Cell::Number(n), Some(f)) => {
                    sheet.write_number_with_format(r32, c16, *n, &f)?;
                }
            }
        }
    }

    workbook.save(path)?;
    info!("report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::sheet_from_file;
    use tempfile::tempdir;

    #[test]
    fn test_write_report_creates_directory_and_keeps_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("report_test.xlsx");
        let report = ReportTable {
            rows: vec![
                vec![Cell::from("Канал"), Cell::from("CATI")],
                vec![Cell::from("Занято"), Cell::Number(0.25)],
                vec![Cell::from("Total"), Cell::Empty],
            ],
            header_rows: 1,
            header_fill: Some(0xFFFF00),
            percent_columns: vec![1],
            column_widths: vec![50.0, 10.0],
            centered: true,
        };

        write_report(&report, &path).unwrap();

        let back = sheet_from_file(&path, None).unwrap();
        assert_eq!(back.cell(0, 1), Some(&Cell::from("CATI")));
        assert_eq!(back.cell(1, 1), Some(&Cell::Number(0.25)));
    }

    #[test]
    fn test_percent_only_below_headings() {
        let report = ReportTable {
            header_rows: 2,
            percent_columns: vec![2],
            ..ReportTable::default()
        };
        assert!(cell_format(&report, 0, 2).is_some());
        assert!(cell_format(&report, 3, 1).is_none());
        assert!(cell_format(&report, 3, 2).is_some());
    }

    #[test]
    fn test_heading_caption_column_is_plain() {
        let report = ReportTable {
            header_rows: 3,
            header_fill: Some(0xFFFF00),
            ..ReportTable::default()
        };
        assert!(cell_format(&report, 0, 0).is_none());
        assert!(cell_format(&report, 2, 0).is_none());
        assert!(cell_format(&report, 1, 1).is_some());
    }
}
