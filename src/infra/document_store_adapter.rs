use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::app::ports::{DirectoryEntry, IdentityDirectory};
use crate::error::{Result, ScreenerError};

/// Firestore-compatible REST directory. Documents are keyed by NSE code and
/// carry `stockName`, `nseCode` and `isin` string fields.
pub struct DocumentStoreDirectory {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    collection: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: HashMap<String, FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldValue {
    string_value: Option<String>,
}

impl Document {
    fn text(&self, field: &str) -> Option<String> {
        self.fields
            .get(field)
            .and_then(|value| value.string_value.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
    }

    fn into_entry(self, code: &str) -> DirectoryEntry {
        DirectoryEntry {
            stock_name: self.text("stockName").unwrap_or_default(),
            nse_code: self.text("nseCode").unwrap_or_else(|| code.to_uppercase()),
            isin: self.text("isin"),
        }
    }
}

fn unavailable(e: impl ToString) -> ScreenerError {
    ScreenerError::CollaboratorUnavailable(e.to_string())
}

impl DocumentStoreDirectory {
    pub fn new(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        collection: impl Into<String>,
        timeout: Duration,
        api_key: Option<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScreenerError::Config(format!("document store client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            project_id: project_id.into(),
            collection: collection.into(),
            api_key,
        })
    }

    fn document_url(&self, code: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.collection,
            code.trim().to_uppercase()
        )
    }
}

#[async_trait]
impl IdentityDirectory for DocumentStoreDirectory {
    async fn resolve(&self, code: &str) -> Result<Option<DirectoryEntry>> {
        let url = self.document_url(code);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await.map_err(unavailable)?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!("No directory document at {}", url);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(unavailable(format!("{} returned {}: {}", url, status, body)));
        }

        let document: Document = response.json().await.map_err(unavailable)?;
        Ok(Some(document.into_entry(code)))
    }

    fn name(&self) -> &'static str {
        "document_store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(base_url: &str) -> DocumentStoreDirectory {
        DocumentStoreDirectory::new(base_url, "demo", "nifty_stocks", Duration::from_millis(500), None).unwrap()
    }

    #[test]
    fn builds_document_url() {
        let directory = directory("http://localhost:8080/v1/");
        assert_eq!(
            directory.document_url(" infy"),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/nifty_stocks/INFY"
        );
    }

    #[test]
    fn parses_document_fields() {
        let document: Document = serde_json::from_str(
            r#"{
                "name": "projects/demo/databases/(default)/documents/nifty_stocks/INFY",
                "fields": {
                    "stockName": {"stringValue": "Infosys Ltd"},
                    "nseCode": {"stringValue": "INFY"},
                    "isin": {"stringValue": ""}
                }
            }"#,
        )
        .unwrap();

        let entry = document.into_entry("infy");
        assert_eq!(entry.stock_name, "Infosys Ltd");
        assert_eq!(entry.nse_code, "INFY");
        assert_eq!(entry.isin, None);
    }

    #[tokio::test]
    async fn unreachable_store_is_collaborator_unavailable() {
        let err = directory("http://127.0.0.1:1").resolve("INFY").await.unwrap_err();
        assert!(matches!(err, ScreenerError::CollaboratorUnavailable(_)));
    }
}
