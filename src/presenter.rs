// Result presenter: turns a session snapshot into what the user sees.

use crate::session::{SessionSnapshot, SubmissionState};
use crate::summary::SummaryLength;
use crate::upload::accepted_extensions_hint;
use serde::Serialize;

pub const APP_TITLE: &str = "Document Summary Assistant";
pub const APP_TAGLINE: &str = "Upload a PDF or image to get a smart summary.";
pub const DROP_PROMPT: &str = "Drag & drop a file here, or click to select";
pub const SUBMIT_LABEL: &str = "Generate Summary";
pub const SUBMIT_BUSY_LABEL: &str = "Summarizing...";
pub const SUMMARY_TITLE: &str = "Generated Summary";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthOption {
    pub length: SummaryLength,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitButton {
    pub label: &'static str,
    pub busy: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPanel {
    pub title: &'static str,
    /// Verbatim, whitespace preserved.
    pub text: String,
    pub copy_label: &'static str,
    pub footnote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub drop_zone: String,
    pub file_selected: bool,
    pub length_options: Vec<LengthOption>,
    pub submit: SubmitButton,
    pub error: Option<String>,
    pub summary: Option<SummaryPanel>,
}

impl SessionView {
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Self {
        let busy = snapshot.status == SubmissionState::InFlight;

        let drop_zone = match &snapshot.file {
            Some(file) => format!("✅ {}", file.name),
            None => DROP_PROMPT.to_string(),
        };

        let length_options = SummaryLength::ALL
            .into_iter()
            .map(|length| LengthOption {
                length,
                label: length.label(),
                active: length == snapshot.summary_length,
            })
            .collect();

        let submit = SubmitButton {
            label: if busy { SUBMIT_BUSY_LABEL } else { SUBMIT_LABEL },
            busy,
            enabled: snapshot.can_submit(),
        };

        let summary = snapshot
            .result
            .as_ref()
            .filter(|result| !result.text.is_empty())
            .map(|result| {
                let mut footnote = format!("received {}", result.received_at.format("%H:%M:%S UTC"));
                if let Some(chars) = result.original_text_length {
                    footnote.push_str(&format!(", extracted {} characters", chars));
                }
                SummaryPanel {
                    title: SUMMARY_TITLE,
                    text: result.text.clone(),
                    copy_label: snapshot.copy_feedback.label(),
                    footnote,
                }
            });

        Self {
            drop_zone,
            file_selected: snapshot.file.is_some(),
            length_options,
            submit,
            error: snapshot.error.clone().filter(|e| !e.is_empty()),
            summary,
        }
    }

    /// Plain-text rendering for the terminal front end.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("== {} ==\n", APP_TITLE));
        out.push_str(&format!("1. Upload Document ({})\n", accepted_extensions_hint()));
        out.push_str(&format!("   {}\n", self.drop_zone));

        let options = self
            .length_options
            .iter()
            .map(|opt| {
                if opt.active {
                    format!("[{}]", opt.label)
                } else {
                    format!(" {} ", opt.label)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str("2. Choose Summary Length\n");
        out.push_str(&format!("   {}\n", options));

        let button = match (self.submit.busy, self.submit.enabled) {
            (true, _) => format!("<⟳ {}>", self.submit.label),
            (false, true) => format!("<{}>", self.submit.label),
            (false, false) => format!("<{}> (disabled)", self.submit.label),
        };
        out.push_str(&format!("   {}\n", button));

        if let Some(error) = &self.error {
            out.push_str(&format!("\n! {}\n", error));
        }

        if let Some(panel) = &self.summary {
            out.push_str(&format!("\n--- {} --- [{}]\n", panel.title, panel.copy_label));
            out.push_str(&panel.text);
            if !panel.text.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&format!("--- {} ---\n", panel.footnote));
        }

        out
    }
}
