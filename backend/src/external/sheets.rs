//! Spreadsheet API client for the external tabular source
//!
//! The rest of the system sees only the `SheetsApi` capability trait. Cells
//! are delivered as plain strings; all type coercion happens in the row
//! validator.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};

/// Tabular read/write/clear/append capabilities of the external source.
///
/// A grid is addressed by `(spreadsheet_id, range)` in A1 notation. Services
/// are generic over this trait so batches can run against any backing store.
pub trait SheetsApi: Send + Sync {
    /// Read a range as rows of cell strings. Trailing empty cells may be
    /// omitted by the backing store, so rows can be ragged.
    fn read(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> impl std::future::Future<Output = AppResult<Vec<Vec<String>>>> + Send;

    /// Overwrite a range with the given rows
    fn update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> impl std::future::Future<Output = AppResult<()>> + Send;

    /// Append rows after the last data row of a range
    fn append(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> impl std::future::Future<Output = AppResult<()>> + Send;

    /// Clear cell values in a range (formatting and headers outside the
    /// range are untouched)
    fn clear(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> impl std::future::Future<Output = AppResult<()>> + Send;

    /// Create a new tab in the spreadsheet
    fn create_tab(
        &self,
        spreadsheet_id: &str,
        title: &str,
    ) -> impl std::future::Future<Output = AppResult<()>> + Send;

    /// List the titles of all tabs in the spreadsheet
    fn list_tab_names(
        &self,
        spreadsheet_id: &str,
    ) -> impl std::future::Future<Output = AppResult<Vec<String>>> + Send;
}

/// Sheets v4 REST client
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    base_url: String,
    api_token: String,
}

/// Response for a values read
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

/// Response for a spreadsheet metadata read
#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

impl GoogleSheetsClient {
    /// Create a new client against the real API
    pub fn new(api_token: String) -> Self {
        Self::with_base_url(api_token, "https://sheets.googleapis.com/v4".to_string())
    }

    /// Create a new client with a custom base URL (for testing)
    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    async fn send_checked(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| AppError::SheetsApi(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::SheetsApi(format!("{} - {}", status, body)));
        }

        Ok(response)
    }

    /// The API returns cells as JSON strings, numbers, or booleans; flatten
    /// everything to the string the user typed.
    fn cell_to_string(cell: &Value) -> String {
        match cell {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl SheetsApi for GoogleSheetsClient {
    async fn read(&self, spreadsheet_id: &str, range: &str) -> AppResult<Vec<Vec<String>>> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, spreadsheet_id, range
        );

        let response = self.send_checked(self.client.get(&url)).await?;
        let data: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::SheetsApi(format!("failed to parse values response: {}", e)))?;

        Ok(data
            .values
            .unwrap_or_default()
            .iter()
            .map(|row| row.iter().map(Self::cell_to_string).collect())
            .collect())
    }

    async fn update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> AppResult<()> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}?valueInputOption=USER_ENTERED",
            self.base_url, spreadsheet_id, range
        );

        self.send_checked(self.client.put(&url).json(&json!({ "values": rows })))
            .await?;
        Ok(())
    }

    async fn append(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> AppResult<()> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.base_url, spreadsheet_id, range
        );

        self.send_checked(self.client.post(&url).json(&json!({ "values": rows })))
            .await?;
        Ok(())
    }

    async fn clear(&self, spreadsheet_id: &str, range: &str) -> AppResult<()> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:clear",
            self.base_url, spreadsheet_id, range
        );

        self.send_checked(self.client.post(&url)).await?;
        Ok(())
    }

    async fn create_tab(&self, spreadsheet_id: &str, title: &str) -> AppResult<()> {
        let url = format!("{}/spreadsheets/{}:batchUpdate", self.base_url, spreadsheet_id);
        let body = json!({
            "requests": [{
                "addSheet": { "properties": { "title": title } }
            }]
        });

        self.send_checked(self.client.post(&url).json(&body)).await?;
        Ok(())
    }

    async fn list_tab_names(&self, spreadsheet_id: &str) -> AppResult<Vec<String>> {
        let url = format!(
            "{}/spreadsheets/{}?fields=sheets.properties.title",
            self.base_url, spreadsheet_id
        );

        let response = self.send_checked(self.client.get(&url)).await?;
        let data: SpreadsheetMeta = response.json().await.map_err(|e| {
            AppError::SheetsApi(format!("failed to parse spreadsheet metadata: {}", e))
        })?;

        Ok(data.sheets.into_iter().map(|s| s.properties.title).collect())
    }
}
