// src/config.rs

use crate::error::{Error, Result};
use crate::fetch::survey_studio::DEFAULT_BASE_URL;
use crate::sink::sheets::GoogleCredentials;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_REPORTS_DIR: &str = "reports";
const DEFAULT_WORK_TIME_SHEET: &str = "Лист1";
const DEFAULT_WORK_TIME_PROJECT: &str = "23-071675-18-C";

/// Process-wide settings, read once from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub reports_dir: PathBuf,
    /// Project-name fragment the work-time report keeps.
    pub work_time_project: String,
    pub work_time_sheet: String,
    pub work_time_spreadsheet_id: Option<String>,
    pub google: Option<GoogleCredentials>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        let google = match (
            var("GOOGLE_CLIENT_ID"),
            var("GOOGLE_CLIENT_SECRET"),
            var("GOOGLE_REFRESH_TOKEN"),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Some(GoogleCredentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => None,
        };
        Self {
            api_url: var_or("SS_API_URL", DEFAULT_BASE_URL),
            reports_dir: PathBuf::from(var_or("REPORTS_DIR", DEFAULT_REPORTS_DIR)),
            work_time_project: var_or("WORK_TIME_PROJECT", DEFAULT_WORK_TIME_PROJECT),
            work_time_sheet: var_or("WORK_TIME_SHEET", DEFAULT_WORK_TIME_SHEET),
            work_time_spreadsheet_id: var("WORK_TIME_SPREADSHEET_ID"),
            google,
        }
    }

    /// Credentials and spreadsheet of the work-time summary; both are required
    /// before anything is fetched.
    pub fn work_time_sheet_target(&self) -> Result<(&GoogleCredentials, &str)> {
        let credentials = self.google.as_ref().ok_or_else(|| {
            Error::Config(
                "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REFRESH_TOKEN must be set".into(),
            )
        })?;
        let id = self
            .work_time_spreadsheet_id
            .as_deref()
            .ok_or_else(|| Error::Config("WORK_TIME_SPREADSHEET_ID must be set".into()))?;
        Ok((credentials, id))
    }
}

/// `config.json` of the call-list preparation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileMakerConfig {
    pub checklist_path: PathBuf,
    pub blacklist_path: PathBuf,
    pub templates_path: PathBuf,
    pub results_path: PathBuf,
}

impl FileMakerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_maker_config_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"checklist_path": "check", "blacklist_path": "black",
                "templates_path": "templates", "results_path": "out"}"#,
        )
        .unwrap();
        let config = FileMakerConfig::load(&path).unwrap();
        assert_eq!(config.templates_path, PathBuf::from("templates"));
        assert_eq!(config.results_path, PathBuf::from("out"));
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileMakerConfig::load(&dir.path().join("nope.json")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_work_time_target_needs_credentials() {
        let settings = Settings {
            api_url: DEFAULT_BASE_URL.into(),
            reports_dir: PathBuf::from("reports"),
            work_time_project: DEFAULT_WORK_TIME_PROJECT.into(),
            work_time_sheet: DEFAULT_WORK_TIME_SHEET.into(),
            work_time_spreadsheet_id: Some("abc".into()),
            google: None,
        };
        assert!(matches!(
            settings.work_time_sheet_target(),
            Err(Error::Config(_))
        ));
    }
}
