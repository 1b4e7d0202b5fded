// src/upload/kind.rs
// Accepted document types

use serde::{Deserialize, Serialize};

const PDF_MAGIC: &[u8] = b"%PDF-";
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [DocumentKind::Pdf, DocumentKind::Png, DocumentKind::Jpeg];

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Png => "image/png",
            DocumentKind::Jpeg => "image/jpeg",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            DocumentKind::Pdf => &["pdf"],
            DocumentKind::Png => &["png"],
            DocumentKind::Jpeg => &["jpg", "jpeg"],
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let normalized = mime.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.mime_type() == normalized)
    }

    /// Resolve from a file extension through the MIME database.
    pub fn from_extension(ext: &str) -> Option<Self> {
        mime_guess::from_ext(ext)
            .iter()
            .find_map(|mime| Self::from_mime(mime.essence_str()))
    }

    /// Check the leading bytes against the format signature.
    pub fn matches_signature(&self, bytes: &[u8]) -> bool {
        match self {
            DocumentKind::Pdf => bytes.starts_with(PDF_MAGIC),
            DocumentKind::Png => bytes.starts_with(PNG_MAGIC),
            DocumentKind::Jpeg => bytes.starts_with(JPEG_MAGIC),
        }
    }

    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.matches_signature(bytes))
    }
}

/// Hint shown next to the drop zone, e.g. `.pdf, .png, .jpg, .jpeg`.
pub fn accepted_extensions_hint() -> String {
    DocumentKind::ALL
        .iter()
        .flat_map(|kind| kind.extensions().iter())
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(", ")
}
