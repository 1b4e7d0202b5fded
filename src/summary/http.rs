// src/summary/http.rs
// HTTP adapter for the remote summarization service

use super::{HealthStatus, SummaryError, SummaryRequest, SummaryResponse, SummaryTransport};
use super::types::ErrorBody;
use crate::config::AppConfig;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://doc-summary-ps510.onrender.com";
const SUMMARIZE_PATH: &str = "/api/summarize";
const HEALTH_PATH: &str = "/";

pub struct HttpSummaryAdapter {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSummaryAdapter {
    /// `timeout = None` leaves the request unbounded.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, SummaryError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SummaryError::Request(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        tracing::info!(
            "Summary adapter initialized: endpoint={}{}, timeout={:?}",
            base_url,
            SUMMARIZE_PATH,
            timeout
        );

        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, SummaryError> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, SUMMARIZE_PATH)
    }

    /// Probe the service root; it answers with a short status message.
    pub async fn check_health(&self) -> Result<HealthStatus, SummaryError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_send_error)?;

        if !status.is_success() {
            return Err(SummaryError::Http {
                status: status.as_u16(),
                detail: ErrorBody::parse_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| SummaryError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl SummaryTransport for HttpSummaryAdapter {
    async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummaryError> {
        tracing::info!(
            "Summarize: uploading {} ({} bytes, {}), length={}",
            request.file.name,
            request.file.len(),
            request.file.mime_type(),
            request.summary_length
        );

        let form = request.to_form()?;

        let resp = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(map_send_error)?;

        if status.is_success() {
            let parsed: SummaryResponse = serde_json::from_str(&body)
                .map_err(|e| SummaryError::InvalidResponse(e.to_string()))?;
            tracing::info!("Summarize: received {} chars", parsed.summary.len());
            Ok(parsed)
        } else {
            let detail = ErrorBody::parse_detail(&body);
            tracing::warn!("Summarize: HTTP {} (detail: {:?})", status, detail);
            Err(SummaryError::Http {
                status: status.as_u16(),
                detail,
            })
        }
    }

    fn name(&self) -> &str {
        "HTTP summary service"
    }
}

fn map_send_error(e: reqwest::Error) -> SummaryError {
    if e.is_timeout() {
        SummaryError::Timeout
    } else {
        SummaryError::Network(e.to_string())
    }
}
