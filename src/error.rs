//! Error types for the resume-forge library.
//!
//! Two families of errors reflect two distinct failure modes:
//!
//! * **Recoverable stage errors**: [`ExtractionError`],
//!   [`ModelInvocationError`], [`SchemaParseError`]. The stage that hit them
//!   reports them to the user and carries on with an empty text or the
//!   default [`crate::record::ResumeRecord`]. They travel inside the stage
//!   outcome types rather than through `Err`.
//!
//! * [`ForgeError`] is **fatal for one action**: the requested action (read an
//!   input file, regenerate a document, write the output) cannot complete.
//!   The session that issued it stays usable; the user may fix the input and
//!   try again.
//!
//! [`ReDerivationError`] sits in between: one is produced per offending form
//! entry, and strict regeneration turns the collected list into
//! [`ForgeError::ReDerivation`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a single library action.
#[derive(Debug, Error)]
pub enum ForgeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Résumé file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Form errors ───────────────────────────────────────────────────────
    /// Regeneration was requested before any résumé was parsed.
    #[error("No résumé has been parsed in this session yet")]
    NothingParsed,

    /// Edited form text does not follow the delimiter contract.
    #[error("{0}")]
    ReDerivation(ReDerivationErrors),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The document renderer failed.
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    /// Could not create or write the output document.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller's sink refused the rendered document (closed pipe, full
    /// disk). The temporary file is already gone when this is returned.
    #[error("Failed to deliver '{file_name}' to the output sink: {source}")]
    DeliveryFailed {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ReDerivationErrors> for ForgeError {
    fn from(errors: ReDerivationErrors) -> Self {
        ForgeError::ReDerivation(errors)
    }
}

/// Text extraction failed; the Extractor falls back to empty text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The pdfium shared library could not be loaded.
    #[error(
        "PDF engine unavailable: {0}\n\
         Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    EngineUnavailable(String),

    /// The PDF is encrypted and no password was supplied.
    #[error("PDF is encrypted and requires a password (--password)")]
    PasswordRequired,

    /// A password was supplied but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The PDF could not be parsed.
    #[error("PDF is corrupt or unreadable: {detail}")]
    CorruptPdf { detail: String },

    /// pdfium failed to produce text for one page.
    #[error("Text extraction failed on page {page}: {detail}")]
    PageText { page: usize, detail: String },

    /// A plain-text upload was not valid UTF-8.
    #[error("Text file is not valid UTF-8 (first invalid byte at offset {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },

    /// The blocking extraction task died.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// The generative model could not produce a reply.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelInvocationError {
    /// No provider could be resolved (missing API key, unknown provider).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider returned an error or was unreachable.
    #[error("LLM API error: {message}")]
    Api { message: String },

    /// The call did not finish within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider answered with no text at all.
    #[error("LLM returned an empty reply")]
    EmptyReply,
}

/// The model reply is not a JSON object matching the record schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaParseError {
    /// The cleaned reply is not JSON.
    #[error("Model reply is not valid JSON (line {line}, column {column}): {detail}")]
    NotJson {
        detail: String,
        line: usize,
        column: usize,
    },

    /// The reply is JSON, but not an object.
    #[error("Model reply is JSON but not an object (found {found})")]
    NotAnObject { found: &'static str },

    /// The object could not be mapped onto the record schema.
    #[error("Model reply does not match the résumé schema: {detail}")]
    Schema { detail: String },
}

/// Why the Structurer fell back to the default record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error(transparent)]
    Model(#[from] ModelInvocationError),

    #[error(transparent)]
    Schema(#[from] SchemaParseError),
}

/// Form section a re-derivation error belongs to.
///
/// Only the free-text sections are split on delimiters; skills never fail
/// (any text is a comma list) and education is edited as discrete fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormSection {
    Experience,
    Publication,
    Certifications,
}

impl fmt::Display for FormSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormSection::Experience => "Experience",
            FormSection::Publication => "Publication",
            FormSection::Certifications => "Certifications",
        };
        f.write_str(name)
    }
}

/// Why an entry could not be read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryProblem {
    /// A delimiter that was expected but not found.
    Missing(&'static str),
    /// The line splits into fields in more than one way, because some field
    /// contains a reserved delimiter.
    Ambiguous { readings: usize },
    /// Non-blank lines after the single entry the section holds.
    ExtraLines(usize),
}

impl fmt::Display for EntryProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryProblem::Missing(delim) => write!(f, "missing {delim:?}"),
            EntryProblem::Ambiguous { readings } => write!(
                f,
                "{readings} possible readings (a field contains a reserved delimiter)"
            ),
            EntryProblem::ExtraLines(n) => write!(
                f,
                "{n} extra line{} (only one entry is kept)",
                if *n == 1 { "" } else { "s" }
            ),
        }
    }
}

/// One form entry that does not follow the delimiter contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{section} entry {entry}: {problem} in {line:?}")]
pub struct ReDerivationError {
    pub section: FormSection,
    /// 1-indexed position of the entry within its section.
    pub entry: usize,
    /// The offending line, as edited.
    pub line: String,
    pub problem: EntryProblem,
}

/// Every offending entry found while re-deriving one form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReDerivationErrors(pub Vec<ReDerivationError>);

impl ReDerivationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReDerivationError> {
        self.0.iter()
    }
}

impl fmt::Display for ReDerivationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} form entr{} could not be re-derived",
            self.0.len(),
            if self.0.len() == 1 { "y" } else { "ies" }
        )?;
        for e in &self.0 {
            write!(f, "\n  • {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ReDerivationErrors {}

/// A document renderer failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The PDF backend rejected the document.
    #[error("PDF backend error: {0}")]
    Pdf(String),

    /// Writing the rendered payload failed.
    #[error("I/O error while rendering: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rederive_error_names_section_and_entry() {
        let e = ReDerivationError {
            section: FormSection::Certifications,
            entry: 2,
            line: "- AWS Certified".into(),
            problem: EntryProblem::Missing(" ("),
        };
        let msg = e.to_string();
        assert!(msg.contains("Certifications entry 2"), "got: {msg}");
        assert!(msg.contains("AWS Certified"), "got: {msg}");
        assert!(msg.contains(r#"missing " (""#), "got: {msg}");
    }

    #[test]
    fn entry_problem_display() {
        assert_eq!(
            EntryProblem::Ambiguous { readings: 2 }.to_string(),
            "2 possible readings (a field contains a reserved delimiter)"
        );
        assert_eq!(
            EntryProblem::ExtraLines(1).to_string(),
            "1 extra line (only one entry is kept)"
        );
        assert_eq!(
            EntryProblem::ExtraLines(3).to_string(),
            "3 extra lines (only one entry is kept)"
        );
    }

    #[test]
    fn rederive_errors_pluralise() {
        let one = ReDerivationErrors(vec![ReDerivationError {
            section: FormSection::Experience,
            entry: 1,
            line: "- Engineer".into(),
            problem: EntryProblem::Missing(" at "),
        }]);
        assert!(one.to_string().starts_with("1 form entry"));

        let mut two = one.clone();
        two.0.push(ReDerivationError {
            section: FormSection::Publication,
            entry: 1,
            line: "- Paper".into(),
            problem: EntryProblem::Missing(" ("),
        });
        assert!(two.to_string().starts_with("2 form entries"));
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn structure_error_is_transparent() {
        let e: StructureError = ModelInvocationError::Timeout { secs: 30 }.into();
        assert_eq!(e.to_string(), "LLM call timed out after 30s");
    }

    #[test]
    fn not_json_display_has_position() {
        let e = SchemaParseError::NotJson {
            detail: "expected value".into(),
            line: 1,
            column: 3,
        };
        assert!(e.to_string().contains("line 1, column 3"));
    }

    #[test]
    fn forge_error_wraps_rederivation() {
        let errs = ReDerivationErrors(vec![ReDerivationError {
            section: FormSection::Certifications,
            entry: 3,
            line: "- Cert".into(),
            problem: EntryProblem::Missing(" ("),
        }]);
        let e: ForgeError = errs.into();
        assert!(e.to_string().contains("Certifications entry 3"));
    }
}
