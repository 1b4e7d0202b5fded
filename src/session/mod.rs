use crate::summary::{SummaryError, SummaryLength, SummaryRequest, SummaryResponse};
use crate::upload::SelectedFile;
use chrono::Utc;
use uuid::Uuid;

pub mod runtime;
pub mod state;

pub use runtime::{Intent, SessionClosed, SessionHandle, SessionRuntime};
pub use state::{CopyFeedback, FileSummary, SessionSnapshot, SubmissionState, SummaryResult};

pub const NO_FILE_MESSAGE: &str = "Please upload a file first.";
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Please upload a file first.")]
    NoFile,

    #[error("A summary request is already in flight")]
    AlreadyInFlight,
}

/// A request the controller has committed to; the caller performs the I/O and
/// reports back through [`SessionController::complete`].
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub generation: u64,
    pub request_id: Uuid,
    pub request: SummaryRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTicket {
    pub stamp: u64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The session moved on (new file or clear) before the response arrived.
    Stale,
}

/// User-facing text for a failed request.
pub fn error_message(err: &SummaryError) -> String {
    format!("Error: {}", err.detail().unwrap_or(GENERIC_ERROR_MESSAGE))
}

/// Owns all session state. Every mutation goes through one of the methods
/// below; renderers only ever see [`SessionSnapshot`]s.
pub struct SessionController {
    file: Option<SelectedFile>,
    summary_length: SummaryLength,
    status: SubmissionState,
    result: Option<SummaryResult>,
    error: Option<String>,
    copy_feedback: CopyFeedback,
    generation: u64,
    copy_stamp: u64,
}

impl SessionController {
    pub fn new(summary_length: SummaryLength) -> Self {
        Self {
            file: None,
            summary_length,
            status: SubmissionState::Idle,
            result: None,
            error: None,
            copy_feedback: CopyFeedback::Copy,
            generation: 0,
            copy_stamp: 0,
        }
    }

    /// Replace the held file. Resets result, error and copy label, and detaches
    /// any in-flight request (it keeps running, its outcome is dropped).
    pub fn select_file(&mut self, file: SelectedFile) {
        if self.status.is_in_flight() {
            tracing::info!(
                "New file selected while a request is in flight; its response will be ignored"
            );
        }
        self.reset_outputs();
        tracing::info!("Session file: {} ({})", file.name, file.mime_type());
        self.file = Some(file);
    }

    /// Affects the next submission only.
    pub fn set_summary_length(&mut self, summary_length: SummaryLength) {
        if self.summary_length != summary_length {
            tracing::debug!("Summary length: {} -> {}", self.summary_length, summary_length);
            self.summary_length = summary_length;
        }
    }

    /// Drop file, result, error and copy label. The length option survives.
    pub fn clear(&mut self) {
        self.reset_outputs();
        self.file = None;
    }

    pub fn submit(&mut self) -> Result<PendingSubmission, SessionError> {
        if self.status.is_in_flight() {
            tracing::warn!("Submit ignored: request already in flight");
            return Err(SessionError::AlreadyInFlight);
        }

        let Some(file) = self.file.clone() else {
            self.error = Some(NO_FILE_MESSAGE.to_string());
            return Err(SessionError::NoFile);
        };

        self.generation += 1;
        self.status = SubmissionState::InFlight;
        self.error = None;
        self.result = None;

        let pending = PendingSubmission {
            generation: self.generation,
            request_id: Uuid::new_v4(),
            request: SummaryRequest::new(file, self.summary_length),
        };

        tracing::info!(
            "Submitting request {} (generation {}): file={}, length={}",
            pending.request_id,
            pending.generation,
            pending.request.file.name,
            pending.request.summary_length
        );

        Ok(pending)
    }

    pub fn complete(
        &mut self,
        generation: u64,
        outcome: Result<SummaryResponse, SummaryError>,
    ) -> Completion {
        if generation != self.generation || !self.status.is_in_flight() {
            tracing::debug!(
                "Discarding stale response (generation {}, current {})",
                generation,
                self.generation
            );
            return Completion::Stale;
        }

        match outcome {
            Ok(response) => {
                tracing::info!("Summary received: {} chars", response.summary.len());
                self.result = Some(SummaryResult {
                    text: response.summary,
                    original_text_length: response.original_text_length,
                    received_at: Utc::now(),
                });
                self.error = None;
                self.status = SubmissionState::Succeeded;
            }
            Err(e) => {
                tracing::warn!("Summary request failed: {}", e);
                self.result = None;
                self.error = Some(error_message(&e));
                self.status = SubmissionState::Failed;
            }
        }

        Completion::Applied
    }

    /// Returns the text to put on the clipboard, or `None` when there is no
    /// summary. The ticket's stamp identifies the matching label reversion.
    pub fn copy_result(&mut self) -> Option<CopyTicket> {
        let text = self
            .result
            .as_ref()
            .map(|r| r.text.clone())
            .filter(|t| !t.is_empty())?;

        self.copy_stamp += 1;
        self.copy_feedback = CopyFeedback::Copied;
        Some(CopyTicket {
            stamp: self.copy_stamp,
            text,
        })
    }

    /// Revert the copy label, but only for the most recent copy.
    pub fn revert_copy_feedback(&mut self, stamp: u64) -> bool {
        if stamp != self.copy_stamp || self.copy_feedback == CopyFeedback::Copy {
            return false;
        }
        self.copy_feedback = CopyFeedback::Copy;
        true
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            file: self.file.as_ref().map(|f| FileSummary {
                name: f.name.clone(),
                mime_type: f.mime_type().to_string(),
                size_bytes: f.len(),
            }),
            summary_length: self.summary_length,
            status: self.status,
            result: self.result.clone(),
            error: self.error.clone(),
            copy_feedback: self.copy_feedback,
        }
    }

    fn reset_outputs(&mut self) {
        if self.status.is_in_flight() {
            self.generation += 1;
        }
        self.status = SubmissionState::Idle;
        self.result = None;
        self.error = None;
        self.copy_feedback = CopyFeedback::Copy;
        self.copy_stamp += 1;
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SummaryLength::default())
    }
}
