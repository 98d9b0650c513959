//! Pipeline stages for résumé parsing and regeneration.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own and any collaborator (PDF engine, model, renderer) can
//! be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ llm ──▶ clean ──▶ structure ──▶ … ──▶ render
//! (upload)  (pdfium)   (model)  (reply)    (record)           (PDF/text)
//! ```
//!
//! 1. [`input`]     : turn a path or in-memory upload into an `UploadedDocument`
//! 2. [`extract`]   : page text via pdfium in `spawn_blocking`, or UTF-8 text
//! 3. [`llm`]       : the single model call; the only stage with network I/O
//! 4. [`clean`]     : deterministic rules that strip reply wrapping
//! 5. [`structure`] : prompt, call, clean, parse, fall back to the default record
//! 6. [`render`]    : document layout plus PDF and text writers
//!
//! The editable form sits between `structure` and `render`; see [`crate::form`].

pub mod clean;
pub mod extract;
pub mod input;
pub mod llm;
pub mod render;
pub mod structure;
