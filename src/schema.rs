// src/schema.rs

use crate::error::{Error, Result};
use crate::table::{RawSheet, SheetLayout, Table};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Column names used by the Survey Studio exports.
pub mod columns {
    pub const PROJECT: &str = "Наименование";
    pub const OPERATOR: &str = "Оператор";
    pub const READY: &str = "Готов";
    pub const TALK: &str = "Разговор";
    pub const CALLBACK: &str = "Перезвон";
    pub const CALLS: &str = "Звонков";
    pub const TOTAL: &str = "Всего";
    pub const SUCCESSFUL: &str = "Успешных";

    pub const RESULT: &str = "Результат";
    pub const CHANNEL: &str = "Фактический канал";
    pub const CARRIER_REGION: &str = "Регион оператора связи";
    pub const CARRIER: &str = "Оператор связи";
}

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Keep rows whose `column` contains `contains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub column: String,
    pub contains: String,
}

/// Declarative description of how one report reads its source table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSchema {
    /// Short name used in file names, e.g. `operator_work_time` or `Doc`.
    pub kind: String,
    pub layout: SheetLayout,
    pub filter: Option<ColumnFilter>,
    /// Source name → canonical name.
    pub rename: Vec<(String, String)>,
    /// Output columns, in output order.
    pub columns: Vec<String>,
    /// Columns holding seconds that the report wants in hours.
    pub durations: Vec<String>,
}

impl ReportSchema {
    fn new(kind: &str, columns: &[&str]) -> Self {
        Self {
            kind: kind.to_string(),
            layout: SheetLayout::default(),
            filter: None,
            rename: Vec::new(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            durations: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::Config(format!("schema `{}` has no columns", self.kind)));
        }
        let mut seen = HashSet::new();
        for c in &self.columns {
            if !seen.insert(c.as_str()) {
                return Err(Error::Config(format!(
                    "schema `{}` lists column `{c}` twice",
                    self.kind
                )));
            }
        }
        if let Some(d) = self.durations.iter().find(|d| !seen.contains(d.as_str())) {
            return Err(Error::Config(format!(
                "schema `{}` converts `{d}` which is not an output column",
                self.kind
            )));
        }
        if let Some(filter) = &self.filter {
            if filter.contains.is_empty() {
                return Err(Error::Config(format!(
                    "schema `{}` has an empty project filter",
                    self.kind
                )));
            }
        }
        Ok(())
    }

    /// Raw sheet → normalized table: header promotion, filter, rename,
    /// projection and seconds → hours.
    pub fn reshape(&self, raw: RawSheet) -> Result<Table> {
        let mut table = raw.into_table(self.layout)?;
        let fetched = table.len();

        if let Some(filter) = &self.filter {
            table.retain_containing(&filter.column, &filter.contains)?;
        }
        table.rename(&self.rename);
        let mut table = table.select(&self.columns)?;
        for column in &self.durations {
            table.map_numeric(column, |v| v / SECONDS_PER_HOUR)?;
        }

        debug!(kind = %self.kind, fetched, kept = table.len(), "reshaped");
        Ok(table)
    }
}

pub fn reshape(raw: RawSheet, schema: &ReportSchema) -> Result<Table> {
    schema.reshape(raw)
}

/// All report schemas, keyed the way the tasks look them up.
#[derive(Debug, Clone)]
pub struct Registry {
    pub work_time: ReportSchema,
    pub outgoing_calls: ReportSchema,
    pub calls_groups: ReportSchema,
    answers: BTreeMap<String, ReportSchema>,
}

impl Registry {
    /// `work_time_project` is the project-name fragment the work-time report keeps.
    pub fn new(work_time_project: &str) -> Self {
        use columns::*;

        let mut work_time = ReportSchema::new(
            "operator_work_time",
            &[PROJECT, OPERATOR, READY, TALK, CALLBACK, CALLS, TOTAL, SUCCESSFUL],
        );
        work_time.layout = SheetLayout {
            leading_rows: 2,
            trailing_rows: 1,
        };
        work_time.filter = Some(ColumnFilter {
            column: PROJECT.to_string(),
            contains: work_time_project.to_string(),
        });
        work_time.durations = [READY, TALK, CALLBACK, CALLS, TOTAL]
            .iter()
            .map(|c| c.to_string())
            .collect();

        let mut answers = BTreeMap::new();
        answers.insert("53173".to_string(), doc_answers());
        answers.insert("53175".to_string(), pharma_answers());

        Self {
            work_time,
            outgoing_calls: ReportSchema::new("outgoing_calls", &[RESULT, CHANNEL]),
            calls_groups: ReportSchema::new("calls_groups", &[CARRIER_REGION, CARRIER, RESULT]),
            answers,
        }
    }

    /// Checked once at startup by every binary.
    pub fn validate(&self) -> Result<()> {
        self.work_time.validate()?;
        self.outgoing_calls.validate()?;
        self.calls_groups.validate()?;
        for schema in self.answers.values() {
            schema.validate()?;
        }
        Ok(())
    }

    pub fn answers(&self, project_id: &str) -> Result<&ReportSchema> {
        self.answers
            .get(project_id)
            .ok_or_else(|| Error::Config(format!("no answers export defined for project {project_id}")))
    }
}

const PARENT_ORG: &str = "DB_Организация__Родительская_организация";
const SPECIALTY_ON_VISIT: &str = "DB_Специальностькатегория_на_визите";
const OFFICIAL_NAME: &str = "DB_Организация__Официальное_название";

fn answers_schema(kind: &str, rename: [(&str, &str); 3], columns: &[&str]) -> ReportSchema {
    let mut schema = ReportSchema::new(kind, columns);
    schema.rename = rename
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
    schema
}

fn doc_answers() -> ReportSchema {
    answers_schema(
        "Doc",
        [(PARENT_ORG, "v1"), (SPECIALTY_ON_VISIT, "v2"), (OFFICIAL_NAME, "v3")],
        &[
            "ID", "RespExtID", "UserID", "UserName", "UserLgIn", "IVDate1", "IVDate2", "Phone",
            "Result", "ContactID", "DB_Город_врачаРегион_врача", "DB_CallIntervalEnd",
            "DB_CallIntervalBegin", "DB_UTC", "DB_Специальность_S__0", "DB_Организация",
            "DB_TimeZone", "DB_Препарат_на_визите", "v1", "DB_Организация__Улица",
            "DB_Внешний_ключ", "DB_ID_респондента_T01_hidden", "DB_Организация__Регион",
            "DB_Связка_Препарат__Специальность", "DB_Номер_анкетыHidden_Т03", "DB_Email",
            "DB_PHONE_1", "DB_ОПРОСИТЬ_ДО", "v2", "v3", "DB_Mark", "DB_GROUP",
            "DB_RESPONDENT_Name", "DB_Организация__Город", "DB_Выборка_Т02_Hidden", "L_qst",
            "TYPE", "Q_100", "Q_101", "Q_102", "Q_102_7T", "Q_103", "Q_104", "Q_105", "Q_106",
            "Q_107",
        ],
    )
}

fn pharma_answers() -> ReportSchema {
    answers_schema(
        "Pharma",
        [
            (PARENT_ORG, "DB_Организация_Род_орг"),
            (SPECIALTY_ON_VISIT, "DB_Спец_категория_на_визите"),
            (OFFICIAL_NAME, "DB_Организация_Офиц_название"),
        ],
        &[
            "ID", "RespExtID", "UserID", "UserName", "UserLgIn", "IVDate1", "IVDate2", "Phone",
            "Result", "ContactID", "DB_Город_врачаРегион_врача", "DB_CallIntervalEnd",
            "DB_CallIntervalBegin", "DB_UTC", "DB_Организация", "DB_TimeZone",
            "DB_Препарат_на_визите", "DB_Организация_Род_орг", "DB_Организация__Улица",
            "DB_Внешний_ключ", "DB_ID_респондента_T01_hidden", "DB_Организация__Регион",
            "DB_Связка_Препарат__Специальность", "DB_Номер_анкетыHidden_Т03",
            "DB_Аптечная_сетьHidden_Т04", "DB_PHONE_1", "DB_ОПРОСИТЬ_ДО",
            "DB_Спец_категория_на_визите", "DB_Организация_Офиц_название", "DB_Mark",
            "DB_GROUP", "DB_RESPONDENT_Name", "DB_Организация__Город", "DB_Статус_звонка",
            "DB_Выборка_Т02_Hidden", "DB_Контакт___Email_Abbott", "L_qst", "TYPE", "Q_100",
            "Q_101", "Q_102", "Q_102_7T", "Q_103", "Q_104", "Q_105", "Q_106", "Q_107",
        ],
    )
}
