//! Recruitment form HTTP client
//!
//! Implements the engine's [`ConfigService`] and [`SubmissionService`]
//! against the recruitment backend:
//!
//! - `GET  /api/public/form-config`   section name to field rows
//! - `POST /api/submit_application`   multipart form data plus the CV
//!
//! # Example
//!
//! ```rust,no_run
//! use recruit_client::{ClientSettings, HttpFormClient};
//! use recruit_forms::ConfigService;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpFormClient::new(ClientSettings::with_base_url("http://localhost:5000"))?;
//! let schema = client.fetch_schema().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use recruit_forms::{
    ConfigLoadError, ConfigService, Schema, Submission, SubmissionError, SubmissionReceipt, SubmissionService,
};
use reqwest::multipart::{Form, Part};
use reqwest::{header, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client construction errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub base_url: String,
    pub config_path: String,
    pub submit_path: String,
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            config_path: "/api/public/form-config".into(),
            submit_path: "/api/submit_application".into(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }
}

/// HTTP implementation of the form collaborators
#[derive(Clone)]
pub struct HttpFormClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config_url: Url,
    submit_url: Url,
    http: reqwest::Client,
}

impl HttpFormClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base = Url::parse(&settings.base_url)?;
        let config_url = base.join(&settings.config_path)?;
        let submit_url = base.join(&settings.submit_path)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("recruit-client/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner { config_url, submit_url, http }),
        })
    }

    pub fn config_url(&self) -> &Url {
        &self.inner.config_url
    }

    pub fn submit_url(&self) -> &Url {
        &self.inner.submit_url
    }
}

/// Error body the backend returns on failure
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Success body of a submission
#[derive(Debug, Deserialize)]
struct SuccessBody {
    message: Option<String>,
}

fn status_text(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("Unknown Status").to_string()
}

#[async_trait]
impl ConfigService for HttpFormClient {
    async fn fetch_schema(&self) -> Result<Schema, ConfigLoadError> {
        let url = self.inner.config_url.clone();
        tracing::debug!(url = %url, "fetching form configuration");

        let response = self
            .inner
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ConfigLoadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "form configuration request failed");
            return Err(ConfigLoadError::Http { status: status.as_u16(), status_text: status_text(status) });
        }

        let body = response.bytes().await.map_err(|e| ConfigLoadError::Network(e.to_string()))?;
        let schema: Schema = serde_json::from_slice(&body).map_err(|e| ConfigLoadError::Decode(e.to_string()))?;
        tracing::info!(sections = schema.len(), "form configuration loaded");
        Ok(schema)
    }
}

#[async_trait]
impl SubmissionService for HttpFormClient {
    async fn submit(&self, submission: Submission) -> Result<SubmissionReceipt, SubmissionError> {
        let mut form = Form::new();
        for (name, value) in submission.fields {
            form = form.text(name, value);
        }
        for (name, file) in submission.files {
            let part = Part::bytes(file.bytes.to_vec())
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|e| SubmissionError::Decode(e.to_string()))?;
            form = form.part(name, part);
        }

        let response = self
            .inner
            .http
            .post(self.inner.submit_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| SubmissionError::Network(e.to_string()))?;

        if status.is_success() {
            // Accepted even when the body is not the expected JSON
            let message = match serde_json::from_slice::<SuccessBody>(&body) {
                Ok(parsed) => parsed.message,
                Err(e) => {
                    tracing::debug!(error = %e, "submission accepted with unreadable body");
                    None
                }
            };
            return Ok(SubmissionReceipt { message });
        }

        let message = match serde_json::from_slice::<ErrorBody>(&body) {
            Ok(ErrorBody { error: Some(error), .. }) => error,
            Ok(ErrorBody { message: Some(message), .. }) => message,
            _ => format!("Submission failed: {}", status_text(status)),
        };
        tracing::warn!(status = status.as_u16(), error = %message, "submission rejected");
        Err(SubmissionError::Rejected { status: status.as_u16(), message })
    }
}
