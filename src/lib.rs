//! # resume-forge
//!
//! Parse a résumé (PDF or text) into a structured record with a language
//! model, edit it as plain text, and regenerate a formatted document.
//!
//! ## Why a structured record?
//!
//! Résumés arrive in every layout imaginable. Asking a model to map the text
//! onto one fixed schema gives the rest of the system a single shape to work
//! with: the editable form, the document layout and the renderers only ever
//! see a [`ResumeRecord`].
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF / text)
//!  │
//!  ├─ 1. Extract    page text via pdfium (spawn_blocking) or UTF-8 text
//!  ├─ 2. Structure  one model call with the schema prompt, reply cleaned and parsed
//!  ├─ 3. Flatten    record → editable form
//!  │      … user edits …
//!  ├─ 4. Re-derive  form → record (delimiter contract, strict or lenient)
//!  ├─ 5. Render     PDF (printpdf) or plain text
//!  └─ 6. Deliver    scoped temp file streamed to the user, then deleted
//! ```
//!
//! Failures in steps 1 and 2 never abort: the user gets an empty text or the
//! default record and sees the error through a [`SessionObserver`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resume_forge::{parse_path, regenerate, deliver, ForgeConfig, NoopObserver, PdfRenderer, ReDeriveMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from the environment (OLLAMA_HOST, OPENAI_API_KEY, …)
//!     let config = ForgeConfig::default();
//!     let mut parsed = parse_path("resume.pdf", &config, &NoopObserver).await?;
//!
//!     parsed.form.skills.push_str(", Rust");
//!
//!     let record = regenerate(&parsed.form, ReDeriveMode::Strict, &NoopObserver)?;
//!     let mut out = std::fs::File::create("resume.out.pdf")?;
//!     deliver(&record, &PdfRenderer::default(), &mut out, &NoopObserver)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `resume-forge` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! resume-forge = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod forge;
pub mod form;
pub mod observer;
pub mod pipeline;
pub mod prompts;
pub mod record;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ForgeConfig, ForgeConfigBuilder};
pub use error::{
    EntryProblem, ExtractionError, ForgeError, FormSection, ModelInvocationError, ReDerivationError,
    ReDerivationErrors, RenderError, SchemaParseError, StructureError,
};
pub use forge::{
    deliver, deliver_in, generate_to_file, parse_document, parse_document_with, parse_path,
    parse_sync, regenerate, ParseOutcome,
};
pub use form::{EditableForm, EducationFields, ReDeriveMode};
pub use observer::{NoopObserver, Observer, SessionObserver, Stage};
pub use pipeline::extract::{Extraction, PdfTextSource, PdfiumTextSource};
pub use pipeline::input::UploadedDocument;
pub use pipeline::llm::{Completion, CompletionModel, ProviderModel};
pub use pipeline::render::{DocumentRenderer, PdfRenderer, TextRenderer};
pub use pipeline::structure::{parse_reply, StructureOutcome, Structurer};
pub use record::{Certification, ContactInfo, Education, Experience, Publication, ResumeRecord};
pub use session::Session;
