//! Google Sheets v4 values client, the only module that talks to
//! sheets.googleapis.com. No retries here; callers decide per tick.

use serde::Deserialize;

use leadwire_core::error::{LeadwireError, Result};

use crate::auth::TokenManager;
use crate::range::RangeAddress;

/// Row-major cell matrix as returned by values.get. Rows may be ragged;
/// the API omits trailing empty cells.
pub type SheetSnapshot = Vec<Vec<String>>;

/// Values read/write client for one spreadsheet.
#[derive(Clone)]
pub struct SheetsClient {
    spreadsheet_id: String,
    auth: TokenManager,
    http: reqwest::Client,
}

impl SheetsClient {
    pub fn new(spreadsheet_id: impl Into<String>, auth: TokenManager) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            auth,
            http: reqwest::Client::new(),
        }
    }

    fn values_url(&self, range: &RangeAddress) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}",
            self.spreadsheet_id, range
        )
    }

    /// Fetch the current matrix for a range. An absent `values` key means
    /// the range is empty, not an error.
    pub async fn values_get(&self, range: &RangeAddress) -> Result<SheetSnapshot> {
        let token = self.auth.bearer().await?;
        let response = self
            .http
            .get(self.values_url(range))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| LeadwireError::Sheets(format!("values.get failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(LeadwireError::Auth("Sheets rejected the access token".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadwireError::Sheets(format!(
                "values.get {range} returned {status}: {}",
                snippet(&body)
            )));
        }

        let body: ValuesResponse = response
            .json()
            .await
            .map_err(|e| LeadwireError::Malformed(format!("Invalid values.get response: {e}")))?;
        Ok(body.values.unwrap_or_default())
    }

    /// Overwrite a range with the given rows (USER_ENTERED semantics, same
    /// as typing into the sheet). Safe to repeat with the same value.
    pub async fn values_update(&self, range: &RangeAddress, rows: Vec<Vec<String>>) -> Result<()> {
        let token = self.auth.bearer().await?;
        let url = format!("{}?valueInputOption=USER_ENTERED", self.values_url(range));
        let body = serde_json::json!({
            "values": rows,
            "range": range.to_string(),
        });

        let response = self
            .http
            .put(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LeadwireError::Sheets(format!("values.update failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(LeadwireError::Auth("Sheets rejected the access token".into()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LeadwireError::Sheets(format!(
                "values.update {range} returned {status}: {}",
                snippet(&text)
            )));
        }
        Ok(())
    }

    /// Write one cell. Claim write-backs land here.
    pub async fn write_cell(&self, range: &RangeAddress, value: &str) -> Result<()> {
        self.values_update(range, vec![vec![value.to_string()]]).await
    }
}

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    values: Option<Vec<Vec<String>>>,
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_response_decode() {
        let body: ValuesResponse = serde_json::from_value(serde_json::json!({
            "range": "LEADS!A2:E600",
            "majorDimension": "ROWS",
            "values": [["Alice", "111", "@a", "Київ"], ["Bob", "222"]]
        }))
        .unwrap();
        let values = body.values.unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0][3], "Київ");
        // ragged rows are preserved as-is
        assert_eq!(values[1].len(), 2);
    }

    #[test]
    fn test_values_response_empty_range() {
        let body: ValuesResponse =
            serde_json::from_value(serde_json::json!({"range": "LEADS!A2:E600"})).unwrap();
        assert!(body.values.is_none());
    }

    #[test]
    fn test_snippet_is_char_safe() {
        let long = "ї".repeat(300);
        assert_eq!(snippet(&long).chars().count(), 200);
    }
}
