//! Editable view of a [`ResumeRecord`].
//!
//! The form is what the user edits between parsing and regeneration. Scalar
//! fields are copied verbatim and education stays structured (one set of
//! discrete fields per entry), but skills, experience, publication and
//! certifications are flattened into free text. Regeneration reads that text
//! back with plain string splitting, so the text has to keep the shape
//! [`EditableForm::from_record`] gave it.
//!
//! ## Delimiter contract
//!
//! ```text
//! Skills          Rust, Go, SQL
//! Experience      - {Role} at {Company} ({StartDate} - {EndDate}), {Location}
//!                   • {bullet}
//!                   • {bullet}
//!                 <blank line>
//!                 - {Role} at {Company} ...
//! Publication     - {Title} ({Journal}, {Volume}, {Issue})
//! Certifications  - {Name} ({Issuer}, {Date})      one per line
//! ```
//!
//! The reserved substrings are ` at `, ` (`, ` - `, `), `, `, `, `)` and a
//! blank line between experience blocks. Each line is split at the first
//! occurrence of each delimiter. When a field value contains a reserved
//! delimiter the line may split in more than one way (`Acme (UK)` as a
//! company); such a line is reported as ambiguous rather than silently read
//! one way. A delimiter that cannot change the reading, such as a location of
//! `Berlin (Remote)`, is accepted.
//!
//! Skills are split on `", "`, then each item is trimmed and empty items are
//! dropped. A skill with surrounding whitespace or an empty skill therefore
//! does not come back unchanged; `[" Rust", ""]` re-derives as `["Rust"]`.
//!
//! The publication section holds one entry. Further non-blank lines are
//! reported, never read.
//!
//! Outside those rules the transform is the identity, see
//! [`EditableForm::to_record`].
//!
//! Bullets may start with `•`, `-` or `*`. Trailing whitespace on any line is
//! ignored and `\r\n` line endings are accepted.

mod flatten;
mod rederive;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use rederive::ReDeriveMode;

/// One education entry as discrete editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationFields {
    pub institution: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
    pub gpa: String,
}

/// The flattened, user-editable form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditableForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub linkedin: String,
    pub github: String,
    pub location: String,
    pub summary: String,
    /// Skills joined with `", "`.
    pub skills: String,
    /// Education entries keyed by their 0-based position in the record.
    pub education: BTreeMap<usize, EducationFields>,
    pub experience: String,
    pub publication: String,
    pub certifications: String,
}
