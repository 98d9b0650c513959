//! Reading an edited form back into a record.

use super::EditableForm;
use crate::error::{EntryProblem, FormSection, ReDerivationError, ReDerivationErrors};
use crate::record::{
    Certification, ContactInfo, Education, Experience, Publication, ResumeRecord,
};
use tracing::warn;

/// What to do with entries that break the delimiter contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReDeriveMode {
    /// Refuse to produce a record while any entry is malformed.
    #[default]
    Strict,
    /// Keep what could be read, empty the rest, report the entries.
    Lenient,
}

impl EditableForm {
    /// Re-derive a record, failing with every malformed entry if there is one.
    ///
    /// For a record whose fields contain no reserved delimiter and no
    /// leading or trailing whitespace, `from_record` followed by `to_record`
    /// returns the original skills, experience, publication and
    /// certifications.
    pub fn to_record(&self) -> Result<ResumeRecord, ReDerivationErrors> {
        let (record, errors) = self.to_record_lenient();
        if errors.is_empty() {
            Ok(record)
        } else {
            Err(errors)
        }
    }

    /// Re-derive a record, keeping partial entries.
    ///
    /// Each malformed entry keeps the fields read before the missing
    /// delimiter; the remaining fields are empty. The offending entries are
    /// returned alongside the record.
    pub fn to_record_lenient(&self) -> (ResumeRecord, ReDerivationErrors) {
        let mut errors = Vec::new();

        let record = ResumeRecord {
            name: self.name.clone(),
            contact: ContactInfo {
                phone: self.phone.clone(),
                email: self.email.clone(),
                linkedin: self.linkedin.clone(),
                github: self.github.clone(),
                location: self.location.clone(),
            },
            summary: self.summary.clone(),
            skills: parse_skills(&self.skills),
            education: self
                .education
                .values()
                .map(|e| Education {
                    institution: e.institution.clone(),
                    degree: e.degree.clone(),
                    start_date: e.start_date.clone(),
                    end_date: e.end_date.clone(),
                    gpa: e.gpa.clone(),
                })
                .collect(),
            experience: parse_experience(&self.experience, &mut errors),
            publication: parse_publication(&self.publication, &mut errors),
            certifications: parse_certifications(&self.certifications, &mut errors),
        };

        for e in &errors {
            warn!("{}", e);
        }
        (record, ReDerivationErrors(errors))
    }

    /// Re-derive according to `mode`.
    pub fn rederive(
        &self,
        mode: ReDeriveMode,
    ) -> Result<(ResumeRecord, ReDerivationErrors), ReDerivationErrors> {
        match mode {
            ReDeriveMode::Strict => self
                .to_record()
                .map(|record| (record, ReDerivationErrors::default())),
            ReDeriveMode::Lenient => Ok(self.to_record_lenient()),
        }
    }
}

// ── Sections ─────────────────────────────────────────────────────────────────

fn parse_skills(text: &str) -> Vec<String> {
    text.split(", ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Lines with `\r\n` normalised and trailing whitespace removed.
fn clean_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim_end)
}

/// Groups of consecutive non-blank lines.
fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut out: Vec<Vec<&str>> = Vec::new();
    let mut current = Vec::new();
    for line in clean_lines(text) {
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn strip_entry_marker(line: &str) -> &str {
    let line = line.trim_start();
    line.strip_prefix("- ").unwrap_or(line)
}

fn strip_bullet_marker(line: &str) -> &str {
    let line = line.trim_start();
    let rest = line
        .strip_prefix('•')
        .or_else(|| line.strip_prefix('-'))
        .or_else(|| line.strip_prefix('*'))
        .unwrap_or(line);
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Splits a line field by field, recording the first missing delimiter.
struct Splitter<'a> {
    rest: &'a str,
    missing: Option<&'static str>,
}

impl<'a> Splitter<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            rest: line,
            missing: None,
        }
    }

    /// The text before `delim`. Once a delimiter is missing, the remainder
    /// goes to the current field and every later field is empty.
    fn take_until(&mut self, delim: &'static str) -> String {
        if self.missing.is_some() {
            return String::new();
        }
        match self.rest.split_once(delim) {
            Some((head, tail)) => {
                self.rest = tail;
                head.to_string()
            }
            None => {
                self.missing = Some(delim);
                std::mem::take(&mut self.rest).to_string()
            }
        }
    }

    /// The text before a closing `)` that ends the line.
    fn take_closing_paren(&mut self) -> String {
        if self.missing.is_some() {
            return String::new();
        }
        match self.rest.strip_suffix(')') {
            Some(inner) => {
                self.rest = "";
                inner.to_string()
            }
            None => {
                self.missing = Some(")");
                std::mem::take(&mut self.rest).to_string()
            }
        }
    }

    /// Whatever is left.
    fn remainder(&mut self) -> String {
        std::mem::take(&mut self.rest).to_string()
    }

    fn error(&self, section: FormSection, entry: usize, line: &str) -> Option<ReDerivationError> {
        self.missing.map(|delim| ReDerivationError {
            section,
            entry,
            line: line.to_string(),
            problem: EntryProblem::Missing(delim),
        })
    }
}

// ── Ambiguity ────────────────────────────────────────────────────────────────

/// Number of ways `text` splits on `delims` in order, each split at any
/// occurrence, with `tail` counting the readings of what is left.
///
/// [`Splitter`] always takes the first occurrence. Its result is the only
/// reading exactly when this returns 1.
fn readings(text: &str, delims: &[&str], tail: &dyn Fn(&str) -> usize) -> usize {
    match delims.split_first() {
        None => tail(text),
        Some((delim, rest)) => text
            .match_indices(delim)
            .map(|(at, _)| readings(&text[at + delim.len()..], rest, tail))
            .sum(),
    }
}

fn experience_readings(header: &str) -> usize {
    readings(header, &[" at ", " (", " - "], &|rest| {
        match rest.matches("), ").count() {
            0 if rest.ends_with(')') || rest.ends_with("),") => 1,
            n => n,
        }
    })
}

/// `{Head} ({a}, {b}, ...)` with `commas` inner separators.
fn parenthesised_readings(line: &str, commas: usize) -> usize {
    readings(line, &[" ("], &|rest| match rest.strip_suffix(')') {
        Some(inner) => readings(inner, &vec![", "; commas], &|_| 1),
        None => 0,
    })
}

fn ambiguity(
    section: FormSection,
    entry: usize,
    line: &str,
    readings: usize,
) -> Option<ReDerivationError> {
    (readings > 1).then(|| ReDerivationError {
        section,
        entry,
        line: line.to_string(),
        problem: EntryProblem::Ambiguous { readings },
    })
}

fn parse_experience(text: &str, errors: &mut Vec<ReDerivationError>) -> Vec<Experience> {
    blocks(text)
        .into_iter()
        .enumerate()
        .map(|(i, block)| {
            let header = block[0];
            let mut s = Splitter::new(strip_entry_marker(header));
            let role = s.take_until(" at ");
            let company = s.take_until(" (");
            let start_date = s.take_until(" - ");
            let (end_date, location) = split_end_and_location(&mut s);
            if let Some(e) = s.error(FormSection::Experience, i + 1, header).or_else(|| {
                let n = experience_readings(strip_entry_marker(header));
                ambiguity(FormSection::Experience, i + 1, header, n)
            }) {
                errors.push(e);
            }

            Experience {
                company,
                role,
                start_date,
                end_date,
                location,
                bullet_points: block[1..]
                    .iter()
                    .map(|l| strip_bullet_marker(l).to_string())
                    .collect(),
            }
        })
        .collect()
}

/// `{EndDate}), {Location}`, or `{EndDate})` / `{EndDate}),` when the
/// location is empty and the editor trimmed the trailing space.
fn split_end_and_location(s: &mut Splitter<'_>) -> (String, String) {
    if s.missing.is_some() {
        return (String::new(), String::new());
    }
    if let Some((end, location)) = s.rest.split_once("), ") {
        let out = (end.to_string(), location.to_string());
        s.rest = "";
        return out;
    }
    if let Some(end) = s
        .rest
        .strip_suffix("),")
        .or_else(|| s.rest.strip_suffix(')'))
    {
        let out = (end.to_string(), String::new());
        s.rest = "";
        return out;
    }
    (s.take_until("), "), String::new())
}

/// The section holds one publication; further lines are reported, not read.
fn parse_publication(text: &str, errors: &mut Vec<ReDerivationError>) -> Publication {
    let mut lines = clean_lines(text).filter(|l| !l.is_empty());
    let Some(line) = lines.next() else {
        return Publication::default();
    };
    let extra: Vec<&str> = lines.collect();

    let mut s = Splitter::new(strip_entry_marker(line));
    let title = s.take_until(" (");
    let inner = s.take_closing_paren();
    let mut parts = Splitter::new(&inner);
    let journal = parts.take_until(", ");
    let volume = parts.take_until(", ");
    let issue = parts.remainder();

    if let Some(e) = s
        .error(FormSection::Publication, 1, line)
        .or_else(|| parts.error(FormSection::Publication, 1, line))
        .or_else(|| {
            let n = parenthesised_readings(strip_entry_marker(line), 2);
            ambiguity(FormSection::Publication, 1, line, n)
        })
    {
        errors.push(e);
    }
    if let Some(first_extra) = extra.first() {
        errors.push(ReDerivationError {
            section: FormSection::Publication,
            entry: 2,
            line: first_extra.to_string(),
            problem: EntryProblem::ExtraLines(extra.len()),
        });
    }

    Publication {
        title,
        journal,
        volume,
        issue,
    }
}

fn parse_certifications(text: &str, errors: &mut Vec<ReDerivationError>) -> Vec<Certification> {
    clean_lines(text)
        .filter(|l| !l.is_empty())
        .enumerate()
        .map(|(i, line)| {
            let mut s = Splitter::new(strip_entry_marker(line));
            let name = s.take_until(" (");
            let inner = s.take_closing_paren();
            let mut parts = Splitter::new(&inner);
            let issuer = parts.take_until(", ");
            let date = parts.remainder();

            if let Some(e) = s
                .error(FormSection::Certifications, i + 1, line)
                .or_else(|| parts.error(FormSection::Certifications, i + 1, line))
                .or_else(|| {
                    let n = parenthesised_readings(strip_entry_marker(line), 1);
                    ambiguity(FormSection::Certifications, i + 1, line, n)
                })
            {
                errors.push(e);
            }

            Certification { name, issuer, date }
        })
        .collect()
}
