//! Observer trait through which the pipeline surfaces diagnostics to the user.
//!
//! Recovered errors never abort the flow, but the user still has to see them:
//! a failed extraction explains an empty form, and the raw model reply is the
//! only way to diagnose a record that came back empty. Inject an
//! [`Arc<dyn SessionObserver>`] into a [`crate::session::Session`] (or pass
//! one to the [`crate::forge`] entry points) to receive these events.
//!
//! # Example
//!
//! ```rust
//! use resume_forge::{SessionObserver, Stage};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct ReplyLog {
//!     replies: Mutex<Vec<String>>,
//! }
//!
//! impl SessionObserver for ReplyLog {
//!     fn on_model_reply(&self, raw_reply: &str) {
//!         self.replies.lock().unwrap().push(raw_reply.to_string());
//!     }
//! }
//!
//! let log = ReplyLog::default();
//! log.on_stage_start(Stage::Structure);
//! log.on_model_reply("{}");
//! assert_eq!(log.replies.lock().unwrap().len(), 1);
//! ```

use crate::error::{ExtractionError, ReDerivationError, StructureError};
use std::fmt;
use std::sync::Arc;

/// Pipeline stage, reported at the start of each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Structure,
    Flatten,
    ReDerive,
    Render,
    Deliver,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extract => "Extracting text",
            Stage::Structure => "Structuring with the model",
            Stage::Flatten => "Building the editable form",
            Stage::ReDerive => "Reading back the edited form",
            Stage::Render => "Rendering the document",
            Stage::Deliver => "Delivering the document",
        };
        f.write_str(s)
    }
}

/// Receives user-facing events. All methods default to no-ops.
///
/// Implementations must be `Send + Sync`: a [`crate::session::Session`]
/// holds its observer as an [`Observer`] (`Arc<dyn SessionObserver>`) and
/// may be moved across tokio worker threads between awaits.
pub trait SessionObserver: Send + Sync {
    /// Called before each stage runs.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Extraction failed; the flow continues with empty text.
    fn on_extraction_error(&self, error: &ExtractionError) {
        let _ = error;
    }

    /// The model answered. Called for every reply, parseable or not.
    fn on_model_reply(&self, raw_reply: &str) {
        let _ = raw_reply;
    }

    /// Structuring failed; the flow continues with the default record.
    ///
    /// `raw_reply` is set when the model answered but the answer could not
    /// be parsed.
    fn on_structuring_error(&self, error: &StructureError, raw_reply: Option<&str>) {
        let _ = (error, raw_reply);
    }

    /// One form entry did not follow the delimiter contract.
    fn on_rederive_error(&self, error: &ReDerivationError) {
        let _ = error;
    }

    /// A rendered document was streamed to the user.
    fn on_delivered(&self, file_name: &str, bytes: u64) {
        let _ = (file_name, bytes);
    }
}

/// Observer that ignores every event. This is the default.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Shared observer handle.
pub type Observer = Arc<dyn SessionObserver>;

/// The default observer handle.
pub fn noop() -> Observer {
    Arc::new(NoopObserver)
}
