// src/upload/mod.rs
// File selection - one PDF/PNG/JPEG document at a time

mod kind;

pub use kind::{accepted_extensions_hint, DocumentKind};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// The one document held by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, kind: DocumentKind, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            kind,
            bytes: bytes.into(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("No file given")]
    NoFile,

    #[error("Only one file can be selected at a time (got {0})")]
    TooManyFiles(usize),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File content does not look like a {expected} document")]
    SignatureMismatch { expected: &'static str },

    #[error("File is empty: {0}")]
    EmptyFile(String),

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Drop/browse surface. Accepts exactly one supported document.
#[derive(Debug, Default, Clone)]
pub struct FileSelector;

impl FileSelector {
    pub fn new() -> Self {
        Self
    }

    /// Multi-path entry point (drag and drop); more than one path is rejected.
    pub fn select_many<P: AsRef<Path>>(&self, paths: &[P]) -> Result<SelectedFile, SelectionError> {
        match paths {
            [] => Err(SelectionError::NoFile),
            [single] => self.select(single),
            many => Err(SelectionError::TooManyFiles(many.len())),
        }
    }

    pub fn select(&self, path: impl AsRef<Path>) -> Result<SelectedFile, SelectionError> {
        let path = path.as_ref();
        let kind = Self::kind_from_path(path)?;

        let bytes = fs::read(path).map_err(|e| SelectionError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self::from_bytes(name, kind, bytes)
    }

    /// Validate an in-memory upload whose type was already resolved.
    pub fn from_bytes(
        name: String,
        kind: DocumentKind,
        bytes: Vec<u8>,
    ) -> Result<SelectedFile, SelectionError> {
        if bytes.is_empty() {
            return Err(SelectionError::EmptyFile(name));
        }

        if !kind.matches_signature(&bytes) {
            return Err(SelectionError::SignatureMismatch {
                expected: kind.mime_type(),
            });
        }

        tracing::info!(
            "Selected {} ({}, {} bytes)",
            name,
            kind.mime_type(),
            bytes.len()
        );

        Ok(SelectedFile::new(name, kind, bytes))
    }

    fn kind_from_path(path: &Path) -> Result<DocumentKind, SelectionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| SelectionError::UnsupportedType(path.display().to_string()))?;

        DocumentKind::from_extension(ext)
            .ok_or_else(|| SelectionError::UnsupportedType(format!(".{}", ext)))
    }
}

/// Expand a leading `~/` so typed paths behave like a file dialog.
pub fn expand_home(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(trimmed)
}
