//! The canonical structured résumé record.
//!
//! [`ResumeRecord`] is always total: every field has an empty default, so a
//! record decoded from a sparse model reply, or the fallback record used after
//! a failure, still carries every key when serialised.
//!
//! ## Lenient decoding
//!
//! The record is decoded from whatever JSON a language model produced, so the
//! decoders here accept the common deviations instead of rejecting the whole
//! reply: `null` for text, numbers for text (`"GPA": 3.8`), a skills string
//! instead of a list, legacy key spellings, and a publication list where a
//! single object is expected.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// A parsed résumé.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRecord {
    #[serde(rename = "Name", deserialize_with = "lenient_text")]
    pub name: String,

    #[serde(
        rename = "ContactInfo",
        alias = "ContactInformation",
        deserialize_with = "lenient_object"
    )]
    pub contact: ContactInfo,

    #[serde(
        rename = "Summary",
        alias = "ProfessionalSummary",
        deserialize_with = "lenient_text"
    )]
    pub summary: String,

    #[serde(
        rename = "Skills",
        alias = "TechnicalSkills",
        deserialize_with = "lenient_text_list"
    )]
    pub skills: Vec<String>,

    #[serde(rename = "Education", deserialize_with = "lenient_list")]
    pub education: Vec<Education>,

    #[serde(
        rename = "Experience",
        alias = "ProfessionalExperience",
        deserialize_with = "lenient_list"
    )]
    pub experience: Vec<Experience>,

    /// Exactly one publication; see [`lenient_publication`] for list replies.
    #[serde(
        rename = "Publication",
        alias = "Publications",
        deserialize_with = "lenient_publication"
    )]
    pub publication: Publication,

    #[serde(rename = "Certifications", deserialize_with = "lenient_list")]
    pub certifications: Vec<Certification>,
}

impl ResumeRecord {
    /// True when no field carries any content.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    #[serde(rename = "Phone", deserialize_with = "lenient_text")]
    pub phone: String,
    #[serde(rename = "Email", deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(rename = "LinkedIn", deserialize_with = "lenient_text")]
    pub linkedin: String,
    #[serde(rename = "GitHub", deserialize_with = "lenient_text")]
    pub github: String,
    #[serde(rename = "Location", deserialize_with = "lenient_text")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    #[serde(rename = "Institution", deserialize_with = "lenient_text")]
    pub institution: String,
    #[serde(rename = "Degree", deserialize_with = "lenient_text")]
    pub degree: String,
    #[serde(rename = "StartDate", deserialize_with = "lenient_text")]
    pub start_date: String,
    #[serde(rename = "EndDate", deserialize_with = "lenient_text")]
    pub end_date: String,
    /// Empty when the résumé does not state one.
    #[serde(rename = "GPA", deserialize_with = "lenient_text")]
    pub gpa: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    #[serde(rename = "Company", deserialize_with = "lenient_text")]
    pub company: String,
    #[serde(rename = "Role", deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(rename = "StartDate", deserialize_with = "lenient_text")]
    pub start_date: String,
    #[serde(rename = "EndDate", deserialize_with = "lenient_text")]
    pub end_date: String,
    #[serde(rename = "Location", deserialize_with = "lenient_text")]
    pub location: String,
    #[serde(rename = "BulletPoints", deserialize_with = "lenient_text_list")]
    pub bullet_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publication {
    #[serde(rename = "Title", deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(rename = "Journal", deserialize_with = "lenient_text")]
    pub journal: String,
    #[serde(rename = "Volume", deserialize_with = "lenient_text")]
    pub volume: String,
    #[serde(rename = "Issue", deserialize_with = "lenient_text")]
    pub issue: String,
}

impl Publication {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    #[serde(rename = "Name", deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(rename = "Issuer", deserialize_with = "lenient_text")]
    pub issuer: String,
    #[serde(rename = "Date", deserialize_with = "lenient_text")]
    pub date: String,
}

// ── Lenient decoders ─────────────────────────────────────────────────────────

fn text_from_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(text_from_value)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other @ Value::Object(_) => other.to_string(),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text_from_value(Value::deserialize(d)?))
}

fn lenient_text_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .map(text_from_value)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(", ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        other => vec![text_from_value(other)],
    })
}

fn lenient_object<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(d)? {
        Value::Object(map) => serde_json::from_value(Value::Object(map))
            .map_err(serde::de::Error::custom),
        Value::Null => Ok(T::default()),
        other => {
            warn!("Expected an object, got {}; using empty default", kind_of(&other));
            Ok(T::default())
        }
    }
}

fn lenient_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<T>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Dropping malformed list entry: {}", e);
                    None
                }
            })
            .collect(),
        obj @ Value::Object(_) => serde_json::from_value::<T>(obj)
            .map(|entry| vec![entry])
            .map_err(serde::de::Error::custom)?,
        other => {
            warn!("Expected a list, got {}; using empty list", kind_of(&other));
            Vec::new()
        }
    })
}

/// A single publication; a list keeps its first element.
fn lenient_publication<'de, D: Deserializer<'de>>(d: D) -> Result<Publication, D::Error> {
    match Value::deserialize(d)? {
        Value::Array(items) => {
            if items.len() > 1 {
                warn!(
                    "Model returned {} publications; keeping the first, dropping {}",
                    items.len(),
                    items.len() - 1
                );
            }
            match items.into_iter().next() {
                Some(first @ Value::Object(_)) => {
                    serde_json::from_value(first).map_err(serde::de::Error::custom)
                }
                _ => Ok(Publication::default()),
            }
        }
        Value::Object(map) => {
            serde_json::from_value(Value::Object(map)).map_err(serde::de::Error::custom)
        }
        Value::Null => Ok(Publication::default()),
        other => {
            warn!("Expected a publication object, got {}", kind_of(&other));
            Ok(Publication::default())
        }
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_record_serialises_every_key() {
        let v = serde_json::to_value(ResumeRecord::default()).unwrap();
        for key in [
            "Name",
            "ContactInfo",
            "Summary",
            "Skills",
            "Education",
            "Experience",
            "Publication",
            "Certifications",
        ] {
            assert!(v.get(key).is_some(), "missing key {key}");
        }
        for key in ["Phone", "Email", "LinkedIn", "GitHub", "Location"] {
            assert_eq!(v["ContactInfo"][key], json!(""));
        }
        for key in ["Title", "Journal", "Volume", "Issue"] {
            assert_eq!(v["Publication"][key], json!(""));
        }
        assert_eq!(v["Skills"], json!([]));
    }

    #[test]
    fn sparse_object_fills_defaults() {
        let r: ResumeRecord =
            serde_json::from_value(json!({"Name": "Jane Doe", "ContactInfo": {"Email": "jane@x.com"}}))
                .unwrap();
        assert_eq!(r.name, "Jane Doe");
        assert_eq!(r.contact.email, "jane@x.com");
        assert!(r.contact.phone.is_empty());
        assert!(r.skills.is_empty());
        assert!(r.publication.is_empty());
    }

    #[test]
    fn legacy_keys_are_accepted() {
        let r: ResumeRecord = serde_json::from_value(json!({
            "ContactInformation": {"Phone": "555"},
            "ProfessionalSummary": "Builder",
            "TechnicalSkills": ["Rust"],
            "ProfessionalExperience": [{"Company": "Acme", "Role": "Dev"}],
            "Publications": {"Title": "Paper"}
        }))
        .unwrap();
        assert_eq!(r.contact.phone, "555");
        assert_eq!(r.summary, "Builder");
        assert_eq!(r.skills, vec!["Rust"]);
        assert_eq!(r.experience[0].company, "Acme");
        assert_eq!(r.publication.title, "Paper");
    }

    #[test]
    fn nulls_and_numbers_become_text() {
        let r: ResumeRecord = serde_json::from_value(json!({
            "Name": null,
            "Skills": null,
            "Education": [{"Institution": "MIT", "GPA": 3.8, "EndDate": 2020}]
        }))
        .unwrap();
        assert_eq!(r.name, "");
        assert!(r.skills.is_empty());
        assert_eq!(r.education[0].gpa, "3.8");
        assert_eq!(r.education[0].end_date, "2020");
    }

    #[test]
    fn skills_string_is_split() {
        let r: ResumeRecord =
            serde_json::from_value(json!({"Skills": "Rust, Go, SQL"})).unwrap();
        assert_eq!(r.skills, vec!["Rust", "Go", "SQL"]);
    }

    #[test]
    fn publication_list_keeps_first() {
        let r: ResumeRecord = serde_json::from_value(json!({
            "Publication": [{"Title": "First"}, {"Title": "Second"}]
        }))
        .unwrap();
        assert_eq!(r.publication.title, "First");
    }

    #[test]
    fn malformed_list_entries_are_dropped() {
        let r: ResumeRecord = serde_json::from_value(json!({
            "Certifications": ["just a string", {"Name": "CKA", "Issuer": "CNCF"}]
        }))
        .unwrap();
        assert_eq!(r.certifications.len(), 1);
        assert_eq!(r.certifications[0].issuer, "CNCF");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let r: ResumeRecord =
            serde_json::from_value(json!({"Name": "A", "Hobbies": ["chess"]})).unwrap();
        assert_eq!(r.name, "A");
    }

    #[test]
    fn blank_detection() {
        assert!(ResumeRecord::default().is_blank());
        let r = ResumeRecord {
            name: "X".into(),
            ..Default::default()
        };
        assert!(!r.is_blank());
    }
}
