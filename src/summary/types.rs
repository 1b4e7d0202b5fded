// src/summary/types.rs
// Summary request/response types and error definitions

use crate::upload::SelectedFile;
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const FIELD_FILE: &str = "file";
pub const FIELD_SUMMARY_LENGTH: &str = "summary_length";

/// Requested summary verbosity; what each preset produces is up to the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    pub const ALL: [SummaryLength; 3] = [SummaryLength::Short, SummaryLength::Medium, SummaryLength::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Short => "short",
            SummaryLength::Medium => "medium",
            SummaryLength::Long => "long",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SummaryLength::Short => "Short",
            SummaryLength::Medium => "Medium",
            SummaryLength::Long => "Long",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(SummaryLength::Short),
            "medium" => Ok(SummaryLength::Medium),
            "long" => Ok(SummaryLength::Long),
            other => Err(format!(
                "Unknown summary length '{}' (expected short, medium or long)",
                other
            )),
        }
    }
}

/// The multipart payload of one summarize call.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub file: SelectedFile,
    pub summary_length: SummaryLength,
}

impl SummaryRequest {
    pub fn new(file: SelectedFile, summary_length: SummaryLength) -> Self {
        Self {
            file,
            summary_length,
        }
    }

    pub fn to_form(&self) -> Result<multipart::Form, SummaryError> {
        let file_part = multipart::Part::bytes(self.file.bytes.to_vec())
            .file_name(self.file.name.clone())
            .mime_str(self.file.mime_type())
            .map_err(|e| SummaryError::Request(e.to_string()))?;

        Ok(multipart::Form::new()
            .part(FIELD_FILE, file_part)
            .text(FIELD_SUMMARY_LENGTH, self.summary_length.as_str()))
    }
}

/// Success body of `POST /api/summarize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: String,
    #[serde(default)]
    pub original_text_length: Option<u64>,
}

/// Error body; `detail` is only used when it is a non-empty string.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn parse_detail(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .detail
            .as_ref()
            .and_then(|value| value.as_str())
            .filter(|detail| !detail.trim().is_empty())
            .map(str::to_string)
    }
}

/// Health probe body of `GET /`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Http { status: u16, detail: Option<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build request: {0}")]
    Request(String),
}

impl SummaryError {
    /// Human-readable message supplied by the remote service, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            SummaryError::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}
