//! Extractor: turn an uploaded document into plain text.
//!
//! PDFs are read page by page through a [`PdfTextSource`]; the default source
//! binds pdfium at runtime. Plain-text uploads are decoded as UTF-8 verbatim.
//!
//! Extraction never fails the flow. Any error is stored in
//! [`Extraction::error`] next to an empty text, and downstream stages run on
//! that empty text.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with thread-local state and no async API. Text
//! extraction runs on Tokio's blocking pool so the runtime's worker threads
//! stay free while pdfium parses the document.

use crate::error::ExtractionError;
use crate::pipeline::input::{DocumentKind, UploadedDocument};
use pdfium_render::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Source of per-page PDF text. The seam to the extraction library.
pub trait PdfTextSource: Send + Sync {
    /// Return the text of every page, in document page order.
    fn page_texts(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<Vec<String>, ExtractionError>;
}

/// Result of one extraction.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// The document text; empty when `error` is set.
    pub text: String,
    /// Pages read (0 for plain text).
    pub page_count: usize,
    pub error: Option<ExtractionError>,
}

impl Extraction {
    fn failed(error: ExtractionError) -> Self {
        Self {
            text: String::new(),
            page_count: 0,
            error: Some(error),
        }
    }
}

/// Extract the text of an upload.
pub async fn extract_text(
    doc: &UploadedDocument,
    source: Arc<dyn PdfTextSource>,
    password: Option<&str>,
) -> Extraction {
    match doc.kind() {
        DocumentKind::PlainText => decode_plain_text(&doc.bytes),
        DocumentKind::Pdf => {
            let bytes = doc.bytes.clone();
            let password = password.map(str::to_string);
            let result = tokio::task::spawn_blocking(move || {
                source.page_texts(&bytes, password.as_deref())
            })
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))
            .and_then(|r| r);

            match result {
                Ok(pages) => {
                    let text = join_pages(&pages);
                    info!("Extracted {} chars from {} PDF pages", text.len(), pages.len());
                    Extraction {
                        text,
                        page_count: pages.len(),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("PDF extraction failed for '{}': {}", doc.name, e);
                    Extraction::failed(e)
                }
            }
        }
    }
}

fn decode_plain_text(bytes: &[u8]) -> Extraction {
    match std::str::from_utf8(bytes) {
        Ok(text) => Extraction {
            text: text.to_string(),
            page_count: 0,
            error: None,
        },
        Err(e) => Extraction::failed(ExtractionError::InvalidUtf8 {
            valid_up_to: e.valid_up_to(),
        }),
    }
}

/// Concatenate page texts in order, with a newline between pages that do not
/// already end in one.
pub fn join_pages(pages: &[String]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.len() + 1).sum());
    for page in pages {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(page);
    }
    text
}

// ── pdfium-backed source ─────────────────────────────────────────────────────

/// Reads page text with pdfium.
///
/// The library handle is bound per call because the upstream `Pdfium` type
/// is not `Send`; the OS caches the `dlopen`, so repeat binds are cheap.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumTextSource;

impl PdfTextSource for PdfiumTextSource {
    fn page_texts(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<Vec<String>, ExtractionError> {
        let pdfium = load_pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| map_load_error(e, password.is_some()))?;

        let pages = document.pages();
        let total = pages.len() as usize;
        debug!("PDF loaded: {} pages", total);

        let mut texts = Vec::with_capacity(total);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| ExtractionError::PageText {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;
            texts.push(text.all());
        }
        Ok(texts)
    }
}

/// Bind the pdfium dynamic library.
///
/// Discovery order:
/// 1. `PDFIUM_LIB_PATH` env var (explicit path to the library file)
/// 2. Alongside the running executable
/// 3. System library search paths
fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            debug!(path = %path, "Loading pdfium from PDFIUM_LIB_PATH");
            let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
                ExtractionError::EngineUnavailable(format!("failed to load {path}: {e}"))
            })?;
            return Ok(Pdfium::new(bindings));
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let lib_path =
                Pdfium::pdfium_platform_library_name_at_path(exe_dir.to_string_lossy().as_ref());
            if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                debug!(dir = %exe_dir.display(), "Loaded pdfium next to the executable");
                return Ok(Pdfium::new(bindings));
            }
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| ExtractionError::EngineUnavailable(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

fn map_load_error(e: PdfiumError, had_password: bool) -> ExtractionError {
    let detail = format!("{:?}", e);
    let lower = detail.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        if had_password {
            ExtractionError::WrongPassword
        } else {
            ExtractionError::PasswordRequired
        }
    } else {
        ExtractionError::CorruptPdf { detail }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPages(Vec<&'static str>);

    impl PdfTextSource for FixedPages {
        fn page_texts(&self, _: &[u8], _: Option<&str>) -> Result<Vec<String>, ExtractionError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct Broken;

    impl PdfTextSource for Broken {
        fn page_texts(&self, _: &[u8], _: Option<&str>) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::CorruptPdf {
                detail: "bad xref".into(),
            })
        }
    }

    fn pdf() -> UploadedDocument {
        UploadedDocument::from_bytes("resume.pdf", b"%PDF-1.4\n".to_vec())
    }

    #[test]
    fn join_pages_inserts_single_newlines() {
        let pages = vec!["one".to_string(), "two\n".to_string(), "three".to_string()];
        assert_eq!(join_pages(&pages), "one\ntwo\nthree");
        assert_eq!(join_pages(&[]), "");
    }

    #[tokio::test]
    async fn pages_are_concatenated_in_order() {
        let out = extract_text(&pdf(), Arc::new(FixedPages(vec!["Jane", "Doe"])), None).await;
        assert_eq!(out.text, "Jane\nDoe");
        assert_eq!(out.page_count, 2);
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn zero_page_pdf_is_empty_not_an_error() {
        let out = extract_text(&pdf(), Arc::new(FixedPages(vec![])), None).await;
        assert_eq!(out.text, "");
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn failure_yields_empty_text_and_error() {
        let out = extract_text(&pdf(), Arc::new(Broken), None).await;
        assert_eq!(out.text, "");
        assert!(matches!(out.error, Some(ExtractionError::CorruptPdf { .. })));
    }

    #[tokio::test]
    async fn plain_text_is_verbatim() {
        let doc = UploadedDocument::from_text("r.txt", "  Jane Doe,\n jane@x.com \n");
        let out = extract_text(&doc, Arc::new(Broken), None).await;
        assert_eq!(out.text, "  Jane Doe,\n jane@x.com \n");
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_is_reported() {
        let doc = UploadedDocument::from_bytes("r.txt", vec![b'o', b'k', 0xff]);
        let out = extract_text(&doc, Arc::new(Broken), None).await;
        assert_eq!(out.text, "");
        assert_eq!(out.error, Some(ExtractionError::InvalidUtf8 { valid_up_to: 2 }));
    }

    #[tokio::test]
    async fn pdfium_source_never_aborts_on_garbage() {
        // Either pdfium is missing (EngineUnavailable) or it rejects the bytes.
        let doc = UploadedDocument::from_bytes("r.pdf", b"%PDF-1.4\n%%EOF".to_vec());
        let out = extract_text(&doc, Arc::new(PdfiumTextSource), None).await;
        assert_eq!(out.text, "");
    }
}
