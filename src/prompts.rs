//! The schema prompt sent to the generative model.
//!
//! The prompt embeds the target JSON schema with the exact field names of
//! [`crate::record::ResumeRecord`] and the résumé text verbatim. Callers can
//! override the template via [`crate::config::ForgeConfig::prompt_template`];
//! the constant here is used only when no override is provided.

/// Placeholder replaced with the extracted résumé text.
pub const RESUME_TEXT_PLACEHOLDER: &str = "{resume_text}";

/// Boilerplate some models put in front of the JSON despite the instructions.
pub const REPLY_BOILERPLATE_PREFIX: &str = "Here is the extracted data in valid JSON format:";

/// Default instruction for turning résumé text into a record.
pub const RESUME_SCHEMA_PROMPT: &str = r#"Parse the following resume and extract the following details in **valid JSON format**:
{
    "Name": "Full Name",
    "ContactInfo": {
        "Phone": "Phone Number",
        "Email": "Email Address",
        "LinkedIn": "LinkedIn Profile",
        "GitHub": "GitHub Profile",
        "Location": "Location"
    },
    "Summary": "Summary text",
    "Skills": ["Skill 1", "Skill 2", "Skill 3"],
    "Education": [
        {
            "Institution": "Institution Name",
            "Degree": "Degree",
            "StartDate": "Start Date",
            "EndDate": "End Date",
            "GPA": "GPA"
        }
    ],
    "Experience": [
        {
            "Company": "Company Name",
            "Role": "Role Title",
            "StartDate": "Start Date",
            "EndDate": "End Date",
            "Location": "Location",
            "BulletPoints": ["Bullet Point 1", "Bullet Point 2"]
        }
    ],
    "Publication": {
        "Title": "Publication Title",
        "Journal": "Journal Name",
        "Volume": "Volume",
        "Issue": "Issue"
    },
    "Certifications": [
        {
            "Name": "Certification Name",
            "Issuer": "Issuer Name",
            "Date": "Certification Date"
        }
    ]
}

Use an empty string or an empty list for anything the resume does not mention.
Respond with the JSON object only.

Resume:
{resume_text}"#;

/// Fill the template with the résumé text.
///
/// Only the first placeholder is replaced, so a résumé that happens to
/// contain the placeholder text is embedded verbatim.
pub fn build_prompt(template: Option<&str>, resume_text: &str) -> String {
    template
        .unwrap_or(RESUME_SCHEMA_PROMPT)
        .replacen(RESUME_TEXT_PLACEHOLDER, resume_text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_names_every_record_key() {
        for key in [
            "\"Name\"",
            "\"ContactInfo\"",
            "\"LinkedIn\"",
            "\"GitHub\"",
            "\"Summary\"",
            "\"Skills\"",
            "\"GPA\"",
            "\"BulletPoints\"",
            "\"Publication\"",
            "\"Certifications\"",
        ] {
            assert!(RESUME_SCHEMA_PROMPT.contains(key), "prompt lacks {key}");
        }
    }

    #[test]
    fn resume_text_is_embedded_verbatim() {
        let p = build_prompt(None, "Jane Doe, jane@x.com");
        assert!(p.ends_with("Resume:\nJane Doe, jane@x.com"));
        assert!(!p.contains(RESUME_TEXT_PLACEHOLDER));
    }

    #[test]
    fn placeholder_inside_resume_survives() {
        let p = build_prompt(Some("T: {resume_text}"), "a {resume_text} b");
        assert_eq!(p, "T: a {resume_text} b");
    }
}
