//! PostgREST client for the hosted `patients` table.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use super::{RemoteError, RemoteResult, RemoteTable, Row};
use crate::config::RemoteConfig;

/// Sent with every request so the backend can attribute traffic.
const APPLICATION_NAME: &str = "oncotrack";

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Table client over the PostgREST HTTP interface.
pub struct RestTable {
    base_url: String,
    table: String,
    api_key: String,
    client: Client,
}

impl RestTable {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// `{base}/rest/v1/{table}`
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("x-application-name", APPLICATION_NAME)
    }

    fn send(&self, builder: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorized(builder)
            .send()
            .map_err(|e| RemoteError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(error_from_status(status, &body))
    }

    fn rows(&self, builder: RequestBuilder) -> RemoteResult<Vec<Row>> {
        self.send(builder)?
            .json::<Vec<Row>>()
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

/// Classify a failed response. Gateway and server errors mean the backend is
/// down, so they count as unreachable.
pub fn error_from_status(status: StatusCode, body: &str) -> RemoteError {
    if status.is_server_error() {
        return RemoteError::Unreachable(format!("HTTP {}: {}", status.as_u16(), body.trim()));
    }
    rejection_from_body(status.as_u16(), body)
}

/// Convert an error response into a [`RemoteError::Rejected`].
pub fn rejection_from_body(status: u16, body: &str) -> RemoteError {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            let mut message = err.message.unwrap_or_default();
            if let Some(details) = err.details.filter(|d| !d.is_empty()) {
                message = format!("{} ({})", message, details);
            }
            RemoteError::Rejected {
                status,
                code: err.code,
                message,
            }
        }
        Err(_) => RemoteError::Rejected {
            status,
            code: None,
            message: body.trim().to_string(),
        },
    }
}

impl RemoteTable for RestTable {
    fn select_all(&self) -> RemoteResult<Vec<Row>> {
        self.rows(
            self.client
                .get(self.table_url())
                .query(&[("select", "*"), ("order", "created_at.desc")]),
        )
    }

    fn select_one(&self, id: &str) -> RemoteResult<Option<Row>> {
        let filter = format!("eq.{}", id);
        let rows = self.rows(
            self.client
                .get(self.table_url())
                .query(&[("select", "*"), ("id", filter.as_str())]),
        )?;
        Ok(rows.into_iter().next())
    }

    fn sample(&self) -> RemoteResult<Option<Row>> {
        let rows = self.rows(
            self.client
                .get(self.table_url())
                .query(&[("select", "*"), ("limit", "1")]),
        )?;
        Ok(rows.into_iter().next())
    }

    fn insert(&self, rows: &[Row]) -> RemoteResult<Vec<Row>> {
        self.rows(
            self.client
                .post(self.table_url())
                .header("Prefer", "return=representation")
                .json(rows),
        )
    }

    fn update(&self, id: &str, row: &Row) -> RemoteResult<Option<Row>> {
        let filter = format!("eq.{}", id);
        // Ask for the stored row back so the write is confirmed
        let rows = self.rows(
            self.client
                .patch(self.table_url())
                .query(&[("id", filter.as_str())])
                .header("Prefer", "return=representation")
                .json(row),
        )?;
        Ok(rows.into_iter().next())
    }

    fn delete(&self, id: &str) -> RemoteResult<()> {
        let filter = format!("eq.{}", id);
        self.send(
            self.client
                .delete(self.table_url())
                .query(&[("id", filter.as_str())]),
        )?;
        Ok(())
    }
}
