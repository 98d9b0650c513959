//! Per-user session state.
//!
//! A [`Session`] holds the record parsed from the latest upload and the form
//! the user is editing. Uploading a new document replaces both. Nothing is
//! persisted; dropping the session discards everything.

use crate::config::ForgeConfig;
use crate::error::ForgeError;
use crate::forge::{self, ParseOutcome};
use crate::form::{EditableForm, ReDeriveMode};
use crate::observer::{self, Observer};
use crate::pipeline::extract::{PdfTextSource, PdfiumTextSource};
use crate::pipeline::input::UploadedDocument;
use crate::pipeline::llm::CompletionModel;
use crate::pipeline::render::DocumentRenderer;
use crate::record::ResumeRecord;
use std::io::Write;
use std::sync::Arc;

/// One user's upload → edit → generate cycle.
pub struct Session {
    config: ForgeConfig,
    observer: Observer,
    pdf_source: Arc<dyn PdfTextSource>,
    model: Option<Arc<dyn CompletionModel>>,
    mode: ReDeriveMode,
    parsed: Option<ParseOutcome>,
}

impl Session {
    pub fn new(config: ForgeConfig) -> Self {
        Self {
            config,
            observer: observer::noop(),
            pdf_source: Arc::new(PdfiumTextSource),
            model: None,
            mode: ReDeriveMode::default(),
            parsed: None,
        }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = observer;
        self
    }

    /// Use this model instead of resolving one from the config.
    pub fn with_model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_pdf_source(mut self, source: Arc<dyn PdfTextSource>) -> Self {
        self.pdf_source = source;
        self
    }

    pub fn with_mode(mut self, mode: ReDeriveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Parse a new upload, replacing any previous record and form.
    pub async fn upload(&mut self, doc: &UploadedDocument) -> &ParseOutcome {
        let outcome = forge::parse_document_with(
            doc,
            &self.config,
            Arc::clone(&self.pdf_source),
            self.model.clone(),
            self.observer.as_ref(),
        )
        .await;
        self.parsed.insert(outcome)
    }

    /// Outcome of the latest upload.
    pub fn parsed(&self) -> Option<&ParseOutcome> {
        self.parsed.as_ref()
    }

    /// Record produced by the Structurer for the latest upload.
    pub fn record(&self) -> Option<&ResumeRecord> {
        self.parsed.as_ref().map(|p| &p.structure.record)
    }

    pub fn form(&self) -> Option<&EditableForm> {
        self.parsed.as_ref().map(|p| &p.form)
    }

    pub fn form_mut(&mut self) -> Option<&mut EditableForm> {
        self.parsed.as_mut().map(|p| &mut p.form)
    }

    /// Re-derive a record from the current form.
    pub fn regenerate(&self) -> Result<ResumeRecord, ForgeError> {
        let form = self.form().ok_or(ForgeError::NothingParsed)?;
        forge::regenerate(form, self.mode, self.observer.as_ref())
    }

    /// Re-derive, render and stream the document to `sink`.
    ///
    /// A failure leaves the session untouched; the user can fix the form and
    /// try again.
    pub fn generate<W: Write>(
        &self,
        renderer: &dyn DocumentRenderer,
        sink: &mut W,
    ) -> Result<u64, ForgeError> {
        let record = self.regenerate()?;
        forge::deliver(&record, renderer, sink, self.observer.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExtractionError, ModelInvocationError};
    use crate::pipeline::llm::Completion;
    use crate::pipeline::render::TextRenderer;
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl CompletionModel for Echo {
        async fn complete(&self, _prompt: &str) -> Result<Completion, ModelInvocationError> {
            Ok(Completion {
                text: self.0.to_string(),
                ..Default::default()
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    struct NoPdf;

    impl PdfTextSource for NoPdf {
        fn page_texts(&self, _: &[u8], _: Option<&str>) -> Result<Vec<String>, ExtractionError> {
            Err(ExtractionError::EngineUnavailable("test".into()))
        }
    }

    fn session(reply: &'static str) -> Session {
        Session::new(ForgeConfig::default())
            .with_model(Arc::new(Echo(reply)))
            .with_pdf_source(Arc::new(NoPdf))
    }

    #[test]
    fn regenerate_before_upload_is_an_error() {
        let s = session("{}");
        assert!(matches!(s.regenerate(), Err(ForgeError::NothingParsed)));
    }

    #[tokio::test]
    async fn edits_flow_into_the_document() {
        let mut s = session(r#"{"Name": "Jane Doe", "Skills": ["Rust"]}"#);
        s.upload(&UploadedDocument::from_text("cv.txt", "Jane Doe"))
            .await;
        assert_eq!(s.form().unwrap().skills, "Rust");

        s.form_mut().unwrap().skills = "Rust, Go".into();
        let record = s.regenerate().unwrap();
        assert_eq!(record.skills, vec!["Rust", "Go"]);

        let mut out = Vec::new();
        s.generate(&TextRenderer, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Rust, Go"));
    }

    #[tokio::test]
    async fn failed_generate_keeps_the_form() {
        let mut s = session(r#"{"Name": "Jane Doe"}"#);
        s.upload(&UploadedDocument::from_text("cv.txt", "Jane Doe"))
            .await;
        s.form_mut().unwrap().certifications = "- Broken".into();
        let mut out = Vec::new();
        assert!(s.generate(&TextRenderer, &mut out).is_err());
        assert!(out.is_empty());

        s.form_mut().unwrap().certifications = "- Fixed (Issuer, 2024)".into();
        assert!(s.generate(&TextRenderer, &mut out).is_ok());
    }

    #[tokio::test]
    async fn new_upload_replaces_state() {
        let mut s = session(r#"{"Name": "Jane Doe"}"#);
        s.upload(&UploadedDocument::from_text("a.txt", "x")).await;
        s.form_mut().unwrap().name = "Edited".into();
        s.upload(&UploadedDocument::from_text("b.txt", "y")).await;
        assert_eq!(s.form().unwrap().name, "Jane Doe");
    }

    #[tokio::test]
    async fn unreadable_pdf_still_reaches_the_model() {
        let mut s = session(r#"{"Name": "From model"}"#);
        let out = s
            .upload(&UploadedDocument::from_bytes("cv.pdf", b"%PDF".to_vec()))
            .await;
        assert!(out.extraction.error.is_some());
        assert_eq!(out.extraction.text, "");
        assert_eq!(out.structure.record.name, "From model");
    }
}
