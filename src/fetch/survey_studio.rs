// src/fetch/survey_studio.rs

use super::SurveySource;
use crate::error::{Error, Result};
use crate::period::Period;
use crate::table::RawSheet;
use crate::workbook;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.survey-studio.com/";

const TOKEN_HEADER: &str = "SS-Token";

#[derive(Debug, Deserialize)]
struct Counter {
    id: Value,
    name: String,
}

/// Blocking Survey Studio API client authenticated by a personal token.
pub struct SurveyStudioClient {
    http: Client,
    base: Url,
    token: String,
}

impl SurveyStudioClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("bad Survey Studio URL `{base_url}`: {e}")))?;
        Ok(Self {
            http: Client::new(),
            base,
            token: token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::Config(format!("joining `{path}` onto {}: {e}", self.base)))
    }

    fn get(&self, url: &Url, query: &[(&str, &str)]) -> Result<Response> {
        let resp = self
            .http
            .get(url.clone())
            .header(TOKEN_HEADER, &self.token)
            .query(query)
            .send()
            .map_err(|e| Error::http(url.as_str(), e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp)
    }

    #[instrument(level = "info", skip(self, url, query), fields(url = %url))]
    fn get_sheet(&self, url: Url, query: &[(&str, &str)]) -> Result<RawSheet> {
        let bytes = self
            .get(&url, query)?
            .bytes()
            .map_err(|e| Error::http(url.as_str(), e))?;
        debug!(bytes = bytes.len(), "downloaded export");
        workbook::sheet_from_bytes(bytes.to_vec())
    }

    #[instrument(level = "debug", skip(self, url), fields(url = %url))]
    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        self.get(&url, &[])?
            .json()
            .map_err(|e| Error::http(url.as_str(), e))
    }
}

impl SurveySource for SurveyStudioClient {
    fn operator_work_time(&self, period: &Period) -> Result<RawSheet> {
        let url = self.endpoint("requestoperatorworktime")?;
        self.get_sheet(url, &[("dateFrom", period.from.as_str()), ("dateTo", period.to.as_str())])
    }

    fn outgoing_calls(&self, project_id: &str, period: &Period) -> Result<RawSheet> {
        let url = self.endpoint(&format!("projects/{project_id}/outgoingcalls"))?;
        self.get_sheet(url, &[("dateFrom", period.from.as_str()), ("dateTo", period.to.as_str())])
    }

    fn counter_id_by_name(&self, project_id: &str, name: &str) -> Result<Option<String>> {
        let url = self.endpoint(&format!("projects/{project_id}/counters"))?;
        let counters: Vec<Counter> = self.get_json(url)?;
        Ok(counters.into_iter().find(|c| c.name == name).map(|c| match c.id {
            Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    fn answers(&self, project_id: &str, counter_id: &str) -> Result<RawSheet> {
        let url = self.endpoint(&format!("projects/{project_id}/answers"))?;
        self.get_sheet(url, &[("counterId", counter_id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_onto_base() {
        let client = SurveyStudioClient::new(DEFAULT_BASE_URL, "tok").unwrap();
        assert_eq!(
            client.endpoint("projects/55555/counters").unwrap().as_str(),
            "https://api.survey-studio.com/projects/55555/counters"
        );
    }

    #[test]
    fn test_bad_base_url_is_config_error() {
        assert!(matches!(
            SurveyStudioClient::new("not a url", "tok"),
            Err(Error::Config(_))
        ));
    }
}
