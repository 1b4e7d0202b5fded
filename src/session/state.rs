use crate::summary::SummaryLength;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed,
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::InFlight)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CopyFeedback {
    #[default]
    Copy,
    Copied,
}

impl CopyFeedback {
    pub fn label(&self) -> &'static str {
        match self {
            CopyFeedback::Copy => "Copy",
            CopyFeedback::Copied => "Copied!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub text: String,
    pub original_text_length: Option<u64>,
    pub received_at: DateTime<Utc>,
}

/// What the selected file looks like to the presenter; bytes stay in the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Read-only copy of the session handed to renderers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub file: Option<FileSummary>,
    pub summary_length: SummaryLength,
    pub status: SubmissionState,
    pub result: Option<SummaryResult>,
    pub error: Option<String>,
    pub copy_feedback: CopyFeedback,
}

impl SessionSnapshot {
    pub fn summary_text(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.text.as_str())
    }

    pub fn can_submit(&self) -> bool {
        self.file.is_some() && !self.status.is_in_flight()
    }
}
