use crate::event::AppEvent;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::mpsc;
use thiserror::Error;
use tokio::runtime::Handle;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

/// Response record for `POST /api/query`. The backend echoes more fields
/// (`status`, `query`, `context`); only the ones the client renders are
/// modeled, everything else is ignored during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub final_answer: Option<String>,
    #[serde(default)]
    pub plan: Option<Value>,
    #[serde(default)]
    pub execution_results: Option<Value>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// Response record for `POST /api/parse-pdf`.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfResponse {
    pub content: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ToolsResponse {
    #[serde(default)]
    tools: Vec<ToolInfo>,
}

/// REST client for the DualMind orchestrator backend. Every public method
/// spawns one async call on the runtime and reports its outcome as exactly
/// one [`AppEvent`] on the UI channel; nothing here blocks the UI thread.
#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    http: reqwest::Client,
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>, tx: mpsc::Sender<AppEvent>, runtime_handle: Handle) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            tx,
            runtime_handle,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Startup probe; issued once per session lifetime, before the chat
    /// view mounts.
    pub fn check_health(&self) {
        let client = self.clone();
        self.runtime_handle.spawn(async move {
            let outcome = client.health().await.map_err(|err| {
                tracing::warn!("health probe failed: {err}");
                err.to_string()
            });
            let _ = client.tx.send(AppEvent::HealthChecked(outcome));
        });
    }

    pub fn list_tools(&self) {
        let client = self.clone();
        self.runtime_handle.spawn(async move {
            let outcome = client.fetch_tools().await.map_err(|err| {
                tracing::warn!("tool listing failed: {err}");
                err.to_string()
            });
            let _ = client.tx.send(AppEvent::ToolsListed(outcome));
        });
    }

    pub fn query(&self, query: String, context: Map<String, Value>) {
        let client = self.clone();
        self.runtime_handle.spawn(async move {
            let outcome = client.run_query(&query, context).await.map_err(|err| {
                tracing::warn!("query failed: {err}");
                err.to_string()
            });
            let _ = client.tx.send(AppEvent::QueryCompleted(outcome));
        });
    }

    pub fn parse_pdf(&self, filename: String, bytes: Vec<u8>) {
        let client = self.clone();
        self.runtime_handle.spawn(async move {
            let outcome = client.run_parse_pdf(&filename, bytes).await.map_err(|err| {
                tracing::warn!("pdf parse failed for {filename}: {err}");
                err.to_string()
            });
            let _ = client.tx.send(AppEvent::PdfParsed { filename, outcome });
        });
    }

    async fn health(&self) -> Result<(), BackendError> {
        let response = self.http.get(self.endpoint("/api/health")).send().await?;
        expect_ok(response)?;
        Ok(())
    }

    async fn fetch_tools(&self) -> Result<Vec<ToolInfo>, BackendError> {
        let response = self.http.get(self.endpoint("/api/tools")).send().await?;
        let listing: ToolsResponse = expect_ok(response)?.json().await?;
        Ok(listing.tools)
    }

    async fn run_query(&self, query: &str, context: Map<String, Value>) -> Result<QueryResponse, BackendError> {
        let body = serde_json::json!({ "query": query, "context": context });
        let response = self
            .http
            .post(self.endpoint("/api/query"))
            .json(&body)
            .send()
            .await?;
        Ok(expect_ok(response)?.json().await?)
    }

    async fn run_parse_pdf(&self, filename: &str, bytes: Vec<u8>) -> Result<PdfResponse, BackendError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(self.endpoint("/api/parse-pdf"))
            .multipart(form)
            .send()
            .await?;
        Ok(expect_ok(response)?.json().await?)
    }
}

fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(BackendError::Status(response.status()))
    }
}
