// src/prepare/mod.rs

//! Turns a raw call-list template into upload files for Survey Studio:
//! numbers already checked or blacklisted are dropped, the rest is reshaped
//! into the platform's import columns and split into two files.

use crate::config::FileMakerConfig;
use crate::error::{Error, Result};
use crate::report::ReportTable;
use crate::sink::write_report;
use crate::table::{Cell, Table};
use crate::workbook::sheet_from_file;
use glob::{glob, Pattern};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CHECKLIST_MARK: &str = "ПРОВЕРКА";
const CHECKLIST_SHEET: &str = "Проверка";
const CHECKLIST_COLUMN: &str = "number";
const BLACKLIST_MARK: &str = "ЧС";
const BLACKLIST_COLUMN: &str = "Phone";
const TEMPLATE_MARKS: [&str; 2] = ["template", "Temp"];

const CALL_FROM: &str = "10:00:00";
const CALL_TO: &str = "22:00:00";

const OUTPUT_COLUMNS: [&str; 13] = [
    "Number",
    "RegionName",
    "OperatorName",
    "TimeDifference",
    "Region",
    "Operator",
    "CallIntervalBegin",
    "CallIntervalEnd",
    "Group",
    "CHECK",
    "Mark",
    "SOURCE",
    "TimeZone",
];

static SEQUENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d+)\.xlsx$").expect("sequence regex should compile"));

/// Columns of the raw template.
mod input {
    pub const TEL: &str = "tel";
    pub const REGION_NAME: &str = "obl_name";
    pub const REGION_CODE: &str = "obl_code";
    pub const CARRIER_NAME: &str = "GrS_name";
    pub const CARRIER_CODE: &str = "GrS_code";
    pub const UTC_DIFF: &str = "UTC_timediff";
}

/// Time zone name the platform expects for a template's `UTC +N` value.
pub fn time_zone(utc_diff: &str) -> Result<&'static str> {
    let zone = match utc_diff.trim() {
        "UTC +2" => "Europe / Kaliningrad",
        "UTC +3" => "Europe / Moscow",
        "UTC +4" => "Europe / Samara",
        "UTC +5" => "Asia / Yekaterinburg",
        "UTC +6" => "Asia / Omsk",
        "UTC +7" => "Asia / Krasnoyarsk",
        "UTC +8" => "Asia / Irkutsk",
        "UTC +9" => "Asia / Yakutsk",
        "UTC +10" => "Asia / Vladivostok",
        "UTC +11" => "Asia / Magadan",
        "UTC +12" => "Asia / Kamchatka",
        other => return Err(Error::UnknownTimeZone(other.to_string())),
    };
    Ok(zone)
}

/// Sample source encoded in the template's file name.
pub fn source_of(file_name: &str) -> Result<&'static str> {
    if file_name.contains("_GEN_") {
        Ok("GEN_OPER")
    } else if file_name.contains("_ROBOGEN_RobotCW_") {
        Ok("GEN_RobotCW")
    } else if file_name.contains("_ROBOGEN_TargetAI_") {
        Ok("GEN_TARGET")
    } else {
        Err(Error::Config(format!(
            "cannot tell the source from template name `{file_name}`"
        )))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let paths = glob(&pattern).map_err(|e| Error::Config(format!("{pattern}: {e}")))?;
    Ok(paths.filter_map(std::result::Result::ok).collect())
}

/// Last file (in name order) under `dir` whose name contains one of `marks`
/// and passes `accept`.
fn find_file(dir: &Path, marks: &[&str], accept: impl Fn(&Path) -> bool) -> Result<PathBuf> {
    files_in(dir)?
        .into_iter()
        .filter(|p| {
            let name = file_name(p);
            marks.iter().any(|m| name.contains(m))
        })
        .filter(|p| accept(p.as_path()))
        .last()
        .ok_or_else(|| Error::InputNotFound {
            pattern: marks.join("|"),
            dir: dir.display().to_string(),
        })
}

fn has_data(path: &Path) -> bool {
    sheet_from_file(path, None)
        .and_then(|raw| raw.into_table(Default::default()))
        .map(|t| !t.is_empty())
        .unwrap_or(false)
}

fn phone_set(path: &Path, sheet: Option<&str>, column: &str) -> Result<HashSet<String>> {
    let table = sheet_from_file(path, sheet)?.into_table(Default::default())?;
    let phones: HashSet<String> = table
        .column(column)?
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect();
    debug!(path = %path.display(), phones = phones.len(), "phone list loaded");
    Ok(phones)
}

/// Two-digit region code, e.g. `7` → `07`.
fn region_code(cell: &Cell) -> String {
    match cell.as_f64() {
        Some(n) => format!("{:02}", n as i64),
        None => cell.to_string(),
    }
}

fn field<'r>(table: &Table, row: &'r [Cell], name: &str) -> Result<&'r Cell> {
    Ok(&row[table.column_index(name)?])
}

fn output_row(table: &Table, row: &[Cell], source: &str) -> Result<Vec<Cell>> {
    let get = |name: &str| field(table, row, name);

    let tel = get(input::TEL)?.to_string();
    let region_name = get(input::REGION_NAME)?.to_string();
    let region = get(input::REGION_CODE)?;
    let carrier_name = get(input::CARRIER_NAME)?.to_string();
    let carrier_code = get(input::CARRIER_CODE)?.to_string();
    let utc_diff = get(input::UTC_DIFF)?.to_string();

    Ok(vec![
        Cell::text(tel.clone()),
        Cell::text(region_name.clone()),
        Cell::text(carrier_name.clone()),
        Cell::text(utc_diff.clone()),
        Cell::text(region_code(region)),
        Cell::text(carrier_code.clone()),
        Cell::from(CALL_FROM),
        Cell::from(CALL_TO),
        Cell::text(format!("{region_name}_{carrier_name}")),
        Cell::text(tel.chars().skip(1).collect::<String>()),
        Cell::text(format!("{region}_{carrier_code}")),
        Cell::from(source),
        Cell::from(time_zone(&utc_diff)?),
    ])
}

/// Template file stem without its `_Temp` / `_template` marker.
fn output_stem(template: &Path) -> String {
    template
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
        .replace("_Temp", "")
        .replace("_template", "")
}

/// `<stem>_<NNN>.xlsx` with one more than the highest number already in `dir`.
fn next_output_path(dir: &Path, stem: &str) -> Result<PathBuf> {
    let pattern = format!(
        "{}/{}*.xlsx",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(stem)
    );
    let paths = glob(&pattern).map_err(|e| Error::Config(format!("{pattern}: {e}")))?;
    let next = paths
        .filter_map(std::result::Result::ok)
        .filter_map(|p| {
            let name = file_name(&p);
            SEQUENCE.captures(&name)?.get(1)?.as_str().parse::<u32>().ok()
        })
        .max()
        .map_or(1, |n| n + 1);
    Ok(dir.join(format!("{stem}_{next:03}.xlsx")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareSummary {
    pub template: PathBuf,
    pub read: usize,
    pub skipped: usize,
    pub outputs: Vec<PathBuf>,
}

/// Build the upload files from the current template and empty the template.
pub fn run(config: &FileMakerConfig) -> Result<PrepareSummary> {
    let checklist_file = find_file(&config.checklist_path, &[CHECKLIST_MARK], |_| true)?;
    let checklist = phone_set(&checklist_file, Some(CHECKLIST_SHEET), CHECKLIST_COLUMN)?;
    let blacklist_file = find_file(&config.blacklist_path, &[BLACKLIST_MARK], |_| true)?;
    let blacklist = phone_set(&blacklist_file, None, BLACKLIST_COLUMN)?;

    let template = find_file(&config.templates_path, &TEMPLATE_MARKS, has_data)?;
    let source = source_of(&file_name(&template))?;
    let raw = sheet_from_file(&template, None)?.into_table(Default::default())?;
    info!(template = %template.display(), rows = raw.len(), source, "template opened");

    let tel = raw.column_index(input::TEL)?;
    let mut rows = Vec::with_capacity(raw.len());
    let mut skipped = 0;
    for row in raw.rows() {
        let number = row[tel].to_string();
        if checklist.contains(&number) || blacklist.contains(&number) {
            debug!(%number, "already checked or blacklisted");
            skipped += 1;
            continue;
        }
        rows.push(output_row(&raw, row, source)?);
    }
    info!(skipped, kept = rows.len(), "numbers filtered");

    let headers: Vec<String> = OUTPUT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let second = rows.split_off(rows.len() / 2);
    let stem = output_stem(&template);

    let mut outputs = Vec::with_capacity(2);
    for half in [rows, second] {
        let records = half.len();
        let path = next_output_path(&config.results_path, &stem)?;
        write_report(&ReportTable::from_table(&Table::new(headers.clone(), half)), &path)?;
        info!(path = %path.display(), records, "upload file ready");
        outputs.push(path);
    }

    write_report(&ReportTable::default(), &template)?;
    info!(template = %template.display(), "template cleared");

    Ok(PrepareSummary {
        template,
        read: raw.len(),
        skipped,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::fs;
    use tempfile::tempdir;

    fn write_xlsx(path: &Path, sheet: Option<&str>, rows: &[Vec<Cell>]) {
        let mut workbook = Workbook::new();
        let ws = workbook.add_worksheet();
        if let Some(name) = sheet {
            ws.set_name(name).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => {
                        ws.write_string(r as u32, c as u16, s).unwrap();
                    }
                    Cell::Number(n) => {
                        ws.write_number(r as u32, c as u16, *n).unwrap();
                    }
                    Cell::Empty => {}
                }
            }
        }
        workbook.save(path).unwrap();
    }

    fn subscriber(tel: f64, region: f64, utc: &str) -> Vec<Cell> {
        vec![
            Cell::Number(tel),
            Cell::from("Тверская обл."),
            Cell::from("МТС"),
            Cell::from(utc),
            Cell::Number(region),
            Cell::Number(1.0),
        ]
    }

    fn setup() -> (tempfile::TempDir, FileMakerConfig) {
        let dir = tempdir().unwrap();
        let config = FileMakerConfig {
            checklist_path: dir.path().join("check"),
            blacklist_path: dir.path().join("black"),
            templates_path: dir.path().join("templates"),
            results_path: dir.path().join("results"),
        };
        for d in [
            &config.checklist_path,
            &config.blacklist_path,
            &config.templates_path,
            &config.results_path,
        ] {
            fs::create_dir_all(d).unwrap();
        }

        write_xlsx(
            &config.checklist_path.join("ПРОВЕРКА_сентябрь.xlsx"),
            Some(CHECKLIST_SHEET),
            &[vec![Cell::from("number")], vec![Cell::Number(79000000001.0)]],
        );
        write_xlsx(
            &config.blacklist_path.join("ЧС.xlsx"),
            None,
            &[vec![Cell::from("Phone")], vec![Cell::from("79000000002")]],
        );

        let mut template = vec![["tel", "obl_name", "GrS_name", "UTC_timediff", "obl_code", "GrS_code"]
            .iter()
            .map(|h| Cell::from(*h))
            .collect::<Vec<_>>()];
        template.push(subscriber(79000000001.0, 69.0, "UTC +3"));
        template.push(subscriber(79000000002.0, 69.0, "UTC +3"));
        for tel in 3..=7 {
            template.push(subscriber(79000000000.0 + tel as f64, 7.0, "UTC +3"));
        }
        write_xlsx(
            &config.templates_path.join("base_GEN_Temp.xlsx"),
            None,
            &template,
        );
        (dir, config)
    }

    #[test]
    fn test_run_filters_splits_and_clears_template() {
        let (_dir, config) = setup();
        write_xlsx(&config.results_path.join("base_GEN_004.xlsx"), None, &[]);

        let summary = run(&config).unwrap();
        assert_eq!(summary.read, 7);
        assert_eq!(summary.skipped, 2);
        assert_eq!(
            summary.outputs,
            vec![
                config.results_path.join("base_GEN_005.xlsx"),
                config.results_path.join("base_GEN_006.xlsx"),
            ]
        );

        let first = sheet_from_file(&summary.outputs[0], None)
            .unwrap()
            .into_table(Default::default())
            .unwrap();
        let second = sheet_from_file(&summary.outputs[1], None)
            .unwrap()
            .into_table(Default::default())
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 3);
        assert_eq!(first.headers(), OUTPUT_COLUMNS);

        let row = &first.rows()[0];
        assert_eq!(row[0], Cell::from("79000000003"));
        assert_eq!(row[4], Cell::from("07"));
        assert_eq!(row[8], Cell::from("Тверская обл._МТС"));
        assert_eq!(row[9], Cell::from("9000000003"));
        assert_eq!(row[10], Cell::from("7_1"));
        assert_eq!(row[11], Cell::from("GEN_OPER"));
        assert_eq!(row[12], Cell::from("Europe / Moscow"));

        assert!(!has_data(&summary.template));
    }

    #[test]
    fn test_first_output_is_001() {
        let dir = tempdir().unwrap();
        assert_eq!(
            next_output_path(dir.path(), "base_GEN").unwrap(),
            dir.path().join("base_GEN_001.xlsx")
        );
    }

    #[test]
    fn test_missing_checklist() {
        let (_dir, config) = setup();
        fs::remove_file(config.checklist_path.join("ПРОВЕРКА_сентябрь.xlsx")).unwrap();
        assert!(matches!(run(&config), Err(Error::InputNotFound { .. })));
    }

    #[test]
    fn test_source_and_zone_lookups() {
        assert_eq!(source_of("x_ROBOGEN_TargetAI_1.xlsx").unwrap(), "GEN_TARGET");
        assert_eq!(source_of("x_ROBOGEN_RobotCW_1.xlsx").unwrap(), "GEN_RobotCW");
        assert!(source_of("x.xlsx").is_err());
        assert_eq!(time_zone("UTC +7").unwrap(), "Asia / Krasnoyarsk");
        assert!(matches!(time_zone("UTC +13"), Err(Error::UnknownTimeZone(_))));
    }
}
