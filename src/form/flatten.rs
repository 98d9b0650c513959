use super::{EditableForm, EducationFields};
use crate::record::{Certification, Experience, Publication, ResumeRecord};

impl EditableForm {
    /// Project a record into its editable form.
    pub fn from_record(record: &ResumeRecord) -> Self {
        let c = &record.contact;
        Self {
            name: record.name.clone(),
            phone: c.phone.clone(),
            email: c.email.clone(),
            linkedin: c.linkedin.clone(),
            github: c.github.clone(),
            location: c.location.clone(),
            summary: record.summary.clone(),
            skills: record.skills.join(", "),
            education: record
                .education
                .iter()
                .enumerate()
                .map(|(i, e)| {
                    (
                        i,
                        EducationFields {
                            institution: e.institution.clone(),
                            degree: e.degree.clone(),
                            start_date: e.start_date.clone(),
                            end_date: e.end_date.clone(),
                            gpa: e.gpa.clone(),
                        },
                    )
                })
                .collect(),
            experience: flatten_experience(&record.experience),
            publication: flatten_publication(&record.publication),
            certifications: flatten_certifications(&record.certifications),
        }
    }
}

fn flatten_experience(entries: &[Experience]) -> String {
    entries
        .iter()
        .map(|exp| {
            let mut block = format!(
                "- {} at {} ({} - {}), {}",
                exp.role, exp.company, exp.start_date, exp.end_date, exp.location
            );
            for bullet in &exp.bullet_points {
                block.push_str("\n  • ");
                block.push_str(bullet);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The empty publication flattens to empty text.
fn flatten_publication(p: &Publication) -> String {
    if p.is_empty() {
        return String::new();
    }
    format!("- {} ({}, {}, {})", p.title, p.journal, p.volume, p.issue)
}

fn flatten_certifications(certs: &[Certification]) -> String {
    certs
        .iter()
        .map(|c| format!("- {} ({}, {})", c.name, c.issuer, c.date))
        .collect::<Vec<_>>()
        .join("\n")
}
