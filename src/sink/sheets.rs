use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde::Serialize;
use tracing::debug;

use crate::config::SheetsConfig;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Serialize, Debug, PartialEq)]
struct ValueRange {
    values: Vec<Vec<String>>,
}

/// Appends rows to a Google Sheet through the values:append endpoint.
pub struct SheetsClient {
    client: reqwest::Client,
    config: SheetsConfig,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(SheetsClient { client, config })
    }

    /// Id and range go in as single path segments, so spaces and `/` in a
    /// sheet name are percent-encoded.
    fn append_url(&self) -> Result<Url> {
        let mut url = Url::parse(SHEETS_API)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot take path segments", SHEETS_API))?
            .push(&self.config.spreadsheet_id)
            .push("values")
            .push(&format!("{}:append", self.config.range));
        Ok(url)
    }

    pub async fn append_row(&self, row: &[&str]) -> Result<()> {
        let body = ValueRange {
            values: vec![row.iter().map(|v| v.to_string()).collect()],
        };
        let response = self
            .client
            .post(self.append_url()?)
            .bearer_auth(&self.config.access_token)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&body)
            .send()
            .await
            .context("Sheets append request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheets append returned {}: {}", status, detail);
        }
        debug!("Appended row to {}", self.config.range);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(range: &str) -> SheetsClient {
        SheetsClient::new(SheetsConfig {
            spreadsheet_id: "abc123".into(),
            access_token: "token".into(),
            range: range.into(),
        })
        .unwrap()
    }

    #[test]
    fn append_endpoint() {
        assert_eq!(
            client("Sheet1").append_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1:append"
        );
    }

    #[test]
    fn sheet_names_are_encoded_in_the_path() {
        assert_eq!(
            client("Planilha 1").append_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Planilha%201:append"
        );
        assert_eq!(
            client("Q1/Q2!A1").append_url().unwrap().as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Q1%2FQ2!A1:append"
        );
    }

    #[test]
    fn one_row_per_body() {
        let body = ValueRange {
            values: vec![vec!["a".into(), "not found".into()]],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"values":[["a","not found"]]}"#
        );
    }
}
