//! Top-level entry points: parse an upload, regenerate, deliver.
//!
//! ## Why are parse errors not `Err`?
//!
//! Parsing is best effort end to end. A PDF that cannot be read still yields
//! an (empty) form, and a model that answers nonsense still yields the
//! default record, so the user always gets something to edit. Those failures
//! travel in [`ParseOutcome`] and through the observer. Only reading the
//! input file, regenerating from a malformed form and writing the output can
//! fail an action.
//!
//! ## Delivery
//!
//! [`deliver`] renders into a [`tempfile::NamedTempFile`], streams the file
//! to the caller's sink and lets the guard delete it, on success and on
//! every error path alike.

use crate::config::ForgeConfig;
use crate::error::{ForgeError, StructureError};
use crate::form::{EditableForm, ReDeriveMode};
use crate::observer::{SessionObserver, Stage};
use crate::pipeline::extract::{extract_text, Extraction, PdfTextSource, PdfiumTextSource};
use crate::pipeline::input::{read_upload, UploadedDocument};
use crate::pipeline::llm::{CompletionModel, ProviderModel};
use crate::pipeline::render::DocumentRenderer;
use crate::pipeline::structure::{StructureOutcome, Structurer};
use crate::record::ResumeRecord;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything one parse produced.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub extraction: Extraction,
    pub structure: StructureOutcome,
    /// The editable projection of `structure.record`.
    pub form: EditableForm,
    pub total_duration_ms: u64,
}

impl ParseOutcome {
    pub fn record(&self) -> &ResumeRecord {
        &self.structure.record
    }
}

/// Resolve the configured model collaborator.
pub fn model_from_config(
    config: &ForgeConfig,
) -> Result<Arc<dyn CompletionModel>, crate::error::ModelInvocationError> {
    Ok(Arc::new(ProviderModel::from_config(config)?))
}

/// Extract, structure and flatten one upload with explicit collaborators.
pub async fn parse_document_with(
    doc: &UploadedDocument,
    config: &ForgeConfig,
    pdf_source: Arc<dyn PdfTextSource>,
    model: Option<Arc<dyn CompletionModel>>,
    observer: &dyn SessionObserver,
) -> ParseOutcome {
    let start = Instant::now();
    info!("Parsing résumé '{}'", doc.name);

    // ── Step 1: Extract ──────────────────────────────────────────────────
    observer.on_stage_start(Stage::Extract);
    let extraction = extract_text(doc, pdf_source, config.password.as_deref()).await;
    if let Some(ref e) = extraction.error {
        observer.on_extraction_error(e);
    }
    debug!("Extracted {} chars", extraction.text.len());

    // ── Step 2: Structure ────────────────────────────────────────────────
    let model = match model {
        Some(m) => Ok(m),
        None => model_from_config(config),
    };
    let structure = match model {
        Ok(model) => {
            Structurer::new(model, config)
                .structure(&extraction.text, observer)
                .await
        }
        Err(e) => {
            observer.on_stage_start(Stage::Structure);
            warn!("No model available, using the default record: {}", e);
            let error = StructureError::from(e);
            observer.on_structuring_error(&error, None);
            StructureOutcome::fallback(error, None)
        }
    };

    // ── Step 3: Flatten ──────────────────────────────────────────────────
    observer.on_stage_start(Stage::Flatten);
    let form = EditableForm::from_record(&structure.record);

    ParseOutcome {
        extraction,
        structure,
        form,
        total_duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Parse an in-memory upload with pdfium and the configured model.
pub async fn parse_document(
    doc: &UploadedDocument,
    config: &ForgeConfig,
    observer: &dyn SessionObserver,
) -> ParseOutcome {
    parse_document_with(doc, config, Arc::new(PdfiumTextSource), None, observer).await
}

/// Parse a résumé file on disk.
///
/// # Errors
/// Only when the file cannot be read; see [`ForgeError`].
pub async fn parse_path(
    path: impl AsRef<Path>,
    config: &ForgeConfig,
    observer: &dyn SessionObserver,
) -> Result<ParseOutcome, ForgeError> {
    let doc = read_upload(path.as_ref()).await?;
    Ok(parse_document(&doc, config, observer).await)
}

/// Synchronous wrapper around [`parse_path`].
///
/// Creates a temporary tokio runtime internally.
pub fn parse_sync(
    path: impl AsRef<Path>,
    config: &ForgeConfig,
    observer: &dyn SessionObserver,
) -> Result<ParseOutcome, ForgeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ForgeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(parse_path(path, config, observer))
}

/// Re-derive the record to render from an edited form.
///
/// Every malformed entry is reported to the observer. In strict mode any
/// such entry fails the regeneration.
pub fn regenerate(
    form: &EditableForm,
    mode: ReDeriveMode,
    observer: &dyn SessionObserver,
) -> Result<ResumeRecord, ForgeError> {
    observer.on_stage_start(Stage::ReDerive);
    let (record, errors) = form.to_record_lenient();
    for e in errors.iter() {
        observer.on_rederive_error(e);
    }
    match mode {
        ReDeriveMode::Strict if !errors.is_empty() => Err(ForgeError::ReDerivation(errors)),
        _ => Ok(record),
    }
}

/// Render `record` and stream it to `sink` through a scoped temporary file.
///
/// Returns the number of bytes delivered.
pub fn deliver<W: Write>(
    record: &ResumeRecord,
    renderer: &dyn DocumentRenderer,
    sink: &mut W,
    observer: &dyn SessionObserver,
) -> Result<u64, ForgeError> {
    let tmp = tempfile::NamedTempFile::new()
        .map_err(|e| ForgeError::Internal(format!("tempfile: {e}")))?;
    deliver_through(tmp, record, renderer, sink, observer)
}

/// [`deliver`] with the temporary file created in `dir`.
pub fn deliver_in<W: Write>(
    dir: impl AsRef<Path>,
    record: &ResumeRecord,
    renderer: &dyn DocumentRenderer,
    sink: &mut W,
    observer: &dyn SessionObserver,
) -> Result<u64, ForgeError> {
    let tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| ForgeError::Internal(format!("tempfile: {e}")))?;
    deliver_through(tmp, record, renderer, sink, observer)
}

fn deliver_through<W: Write>(
    mut tmp: tempfile::NamedTempFile,
    record: &ResumeRecord,
    renderer: &dyn DocumentRenderer,
    sink: &mut W,
    observer: &dyn SessionObserver,
) -> Result<u64, ForgeError> {
    observer.on_stage_start(Stage::Render);
    let bytes = renderer.render(record)?;

    observer.on_stage_start(Stage::Deliver);
    let tmp_path = tmp.path().to_path_buf();
    let tmp_err = |e: std::io::Error| ForgeError::OutputWriteFailed {
        path: tmp_path.clone(),
        source: e,
    };
    tmp.write_all(&bytes).map_err(tmp_err)?;
    tmp.flush().map_err(tmp_err)?;
    tmp.seek(SeekFrom::Start(0)).map_err(tmp_err)?;

    let sink_err = |e: std::io::Error| ForgeError::DeliveryFailed {
        file_name: renderer.file_name().to_string(),
        source: e,
    };
    let mut sent = 0u64;
    let mut chunk = [0u8; 8192];
    loop {
        let n = match tmp.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(tmp_err(e)),
        };
        sink.write_all(&chunk[..n]).map_err(sink_err)?;
        sent += n as u64;
    }
    sink.flush().map_err(sink_err)?;
    debug!("Streamed {} bytes of {}", sent, renderer.file_name());

    // `tmp` is dropped (and the file deleted) here
    drop(tmp);
    observer.on_delivered(renderer.file_name(), sent);
    Ok(sent)
}

/// Render `record` straight to `path`.
///
/// Uses an atomic write (temp file in the target directory, then rename) so
/// a failed render never leaves a partial document behind.
pub fn generate_to_file(
    record: &ResumeRecord,
    renderer: &dyn DocumentRenderer,
    path: impl AsRef<Path>,
    observer: &dyn SessionObserver,
) -> Result<u64, ForgeError> {
    let path = path.as_ref();
    let write_err = |e: std::io::Error| ForgeError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    observer.on_stage_start(Stage::Render);
    let bytes = renderer.render(record)?;

    observer.on_stage_start(Stage::Deliver);
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    let len = bytes.len() as u64;
    info!("Wrote {} ({} bytes)", path.display(), len);
    observer.on_delivered(&path.display().to_string(), len);
    Ok(len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::pipeline::render::TextRenderer;

    #[test]
    fn strict_regenerate_fails_on_malformed_entry() {
        let form = EditableForm {
            certifications: "- Broken".into(),
            ..Default::default()
        };
        let err = regenerate(&form, ReDeriveMode::Strict, &NoopObserver).unwrap_err();
        assert!(matches!(err, ForgeError::ReDerivation(ref e) if e.len() == 1));
        let rec = regenerate(&form, ReDeriveMode::Lenient, &NoopObserver).unwrap();
        assert_eq!(rec.certifications[0].name, "Broken");
    }

    #[test]
    fn deliver_streams_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let record = ResumeRecord {
            name: "Jane Doe".into(),
            ..Default::default()
        };
        let mut sink = Vec::new();
        let n = deliver_in(dir.path(), &record, &TextRenderer, &mut sink, &NoopObserver).unwrap();
        assert_eq!(n as usize, sink.len());
        assert!(String::from_utf8(sink).unwrap().starts_with("Name: Jane Doe"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failing_sink_is_a_delivery_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = deliver_in(
            dir.path(),
            &ResumeRecord::default(),
            &TextRenderer,
            &mut ClosedPipe,
            &NoopObserver,
        )
        .unwrap_err();
        match err {
            ForgeError::DeliveryFailed {
                ref file_name,
                ref source,
            } => {
                assert_eq!(file_name, "resume.txt");
                assert_eq!(source.kind(), std::io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains(&dir.path().display().to_string()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn generate_to_file_is_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("resume.txt");
        let n = generate_to_file(&ResumeRecord::default(), &TextRenderer, &out, &NoopObserver)
            .unwrap();
        assert_eq!(std::fs::metadata(&out).unwrap().len(), n);
        let leftovers = std::fs::read_dir(out.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
