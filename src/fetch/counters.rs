// src/fetch/counters.rs

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

/// Anything that can answer "what is the value of counter `label`".
pub trait CounterSource {
    /// `None` means the counter is not published (yet); that is not zero.
    fn counter_value(&self, label: &str) -> Result<Option<String>>;
}

/// The public daily-counters page of a project: a table whose rows read
/// `label | … | value | …`.
pub struct CounterPage {
    http: Client,
    url: Url,
}

impl CounterPage {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|e| Error::Config(format!("bad counters page URL `{url}`: {e}")))?;
        Ok(Self {
            http: Client::new(),
            url,
        })
    }

    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    fn fetch_html(&self) -> Result<String> {
        let resp = self
            .http
            .get(self.url.clone())
            .send()
            .map_err(|e| Error::http(self.url.as_str(), e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: self.url.to_string(),
                status,
            });
        }
        resp.text().map_err(|e| Error::http(self.url.as_str(), e))
    }
}

impl CounterSource for CounterPage {
    fn counter_value(&self, label: &str) -> Result<Option<String>> {
        let html = self.fetch_html()?;
        let value = find_counter(&html, label);
        debug!(label, ?value, "counter lookup");
        Ok(value)
    }
}

fn cell_text(cell: scraper::ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}

/// Value cell of the first four-cell row whose first cell equals `label`.
pub fn find_counter(html: &str, label: &str) -> Option<String> {
    let rows = Selector::parse("tr").expect("row selector should parse");
    let cells = Selector::parse("td").expect("cell selector should parse");

    Html::parse_document(html).select(&rows).find_map(|row| {
        let tds: Vec<_> = row.select(&cells).collect();
        if tds.len() != 4 || cell_text(tds[0]) != label {
            return None;
        }
        Some(cell_text(tds[2]))
    })
}

/// Counter values are printed with thousands separators, e.g. `1 204`.
pub fn parse_count(label: &str, value: &str) -> Result<u64> {
    let digits: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    digits.parse().map_err(|_| Error::CounterValue {
        name: label.to_string(),
        value: value.to_string(),
    })
}
