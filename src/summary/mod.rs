// src/summary/mod.rs
// Summary Module - transport to the remote summarization service

mod http;
mod types;

pub use http::{HttpSummaryAdapter, DEFAULT_API_BASE_URL};
pub use types::{HealthStatus, SummaryError, SummaryLength, SummaryRequest, SummaryResponse};

use async_trait::async_trait;

/// One best-effort summarize call: no retries, no cancellation.
#[async_trait]
pub trait SummaryTransport: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<SummaryResponse, SummaryError>;

    /// Get provider name
    fn name(&self) -> &str;
}
