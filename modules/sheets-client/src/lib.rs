pub mod error;
pub mod types;

pub use error::{Result, SheetsError};
pub use types::{AppendResponse, ValueRange, WorksheetProperties};

use std::time::Duration;

use serde::de::DeserializeOwned;
use types::{AppendBody, SpreadsheetMeta};

const BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Client for one spreadsheet. Takes a ready OAuth bearer token; obtaining
/// and refreshing it is the caller's concern.
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    spreadsheet_id: String,
}

impl SheetsClient {
    pub fn new(token: &str, spreadsheet_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            token: token.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Properties of the worksheet at `index` (0-based tab order).
    pub async fn worksheet(&self, index: usize) -> Result<WorksheetProperties> {
        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties",
            self.base_url, self.spreadsheet_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let meta: SpreadsheetMeta = read_json(resp).await?;
        meta.sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.index == index)
            .ok_or(SheetsError::MissingWorksheet(index))
    }

    /// Read a range as rows of strings. Trailing empty cells and rows are
    /// omitted by the API.
    pub async fn get_values(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let values: ValueRange = read_json(resp).await?;
        Ok(values.into_strings())
    }

    /// Append rows after the last row of the table containing `range`.
    /// Values are stored as given (`RAW`), so codes like `00` keep their zeros.
    /// `OVERWRITE` fills the blank rows below the table instead of inserting
    /// new grid rows ahead of them.
    pub async fn append_rows(&self, range: &str, rows: &[Vec<String>]) -> Result<AppendResponse> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:append?valueInputOption=RAW&insertDataOption=OVERWRITE",
            self.base_url,
            self.spreadsheet_id,
            urlencoding::encode(range)
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&AppendBody { values: rows })
            .send()
            .await?;

        let appended: AppendResponse = read_json(resp).await?;
        tracing::debug!(
            range = %appended.updates.updated_range,
            rows = appended.updates.updated_rows,
            "Appended rows"
        );
        Ok(appended)
    }
}

async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(SheetsError::Api {
            status: status.as_u16(),
            message,
        });
    }
    let body = resp.text().await?;
    Ok(serde_json::from_str(&body)?)
}
