//! Input resolution: turn a user upload into an [`UploadedDocument`].
//!
//! Uploads arrive either as a path on disk (CLI) or as bytes with a file name
//! and an optional media type (embedding applications). Both end up as the
//! same in-memory document; the Extractor then decides from the content, the
//! name and the media type whether to treat it as a PDF or as plain text.

use crate::error::ForgeError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Media type browsers and upload widgets attach to PDF files.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// How the Extractor should read a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

/// An uploaded résumé, held in memory for the duration of one parse.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Original file name, used for kind detection and messages.
    pub name: String,
    /// Declared media type, if the upload carried one.
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedDocument {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            media_type: None,
            bytes: bytes.into(),
        }
    }

    /// A plain-text upload, e.g. pasted résumé text.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            media_type: Some("text/plain".to_string()),
            bytes: text.as_bytes().to_vec(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// PDF when the content starts with `%PDF`, the name ends in `.pdf`, or
    /// the media type says so; plain text otherwise.
    pub fn kind(&self) -> DocumentKind {
        let magic = self.bytes.starts_with(b"%PDF");
        let by_name = self.name.to_ascii_lowercase().ends_with(".pdf");
        let by_type = self
            .media_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(PDF_MEDIA_TYPE));
        if magic || by_name || by_type {
            DocumentKind::Pdf
        } else {
            DocumentKind::PlainText
        }
    }
}

/// Read an upload from disk.
pub async fn read_upload(path: &Path) -> Result<UploadedDocument, ForgeError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => ForgeError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ForgeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ForgeError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read upload {} ({} bytes)", path.display(), bytes.len());
    Ok(UploadedDocument::from_bytes(name, bytes))
}
