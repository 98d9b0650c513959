//! Document rendering: lay out a [`ResumeRecord`] and write it as PDF or text.
//!
//! Layout and output format are separate. [`document_lines`] decides what
//! the document says, line by line; each [`DocumentRenderer`] only decides how
//! those lines look. The PDF and the text output therefore never disagree on
//! content.
//!
//! ## Why builtin fonts?
//!
//! The 14 standard PDF fonts need no font file on disk and keep the output
//! small. They only cover WinAnsi, so [`pdf_safe`] maps common typography
//! (bullets, dashes, curly quotes) to ASCII and drops anything else that
//! cannot be encoded.

use crate::error::RenderError;
use crate::record::ResumeRecord;
use printpdf::*;
use std::io::BufWriter;
use tracing::debug;

/// Visual role of a layout line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// The `Name:` line at the top.
    Title,
    /// A section label such as `Education:`.
    Heading,
    Body,
    /// An experience bullet, indented under its entry.
    Bullet,
}

/// One line of the rendered document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocLine {
    pub text: String,
    pub style: LineStyle,
}

impl DocLine {
    fn new(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// The document, line by line. Empty fields produce empty values, never a
/// missing section.
pub fn document_lines(record: &ResumeRecord) -> Vec<DocLine> {
    use LineStyle::*;

    let c = &record.contact;
    let mut lines = vec![
        DocLine::new(Title, format!("Name: {}", record.name)),
        DocLine::new(Heading, "Contact Information:"),
        DocLine::new(Body, format!("- Phone: {}", c.phone)),
        DocLine::new(Body, format!("- Email: {}", c.email)),
        DocLine::new(Body, format!("- LinkedIn: {}", c.linkedin)),
        DocLine::new(Body, format!("- GitHub: {}", c.github)),
        DocLine::new(Body, format!("- Location: {}", c.location)),
        DocLine::new(Heading, "Professional Summary:"),
    ];
    lines.extend(record.summary.lines().map(|l| DocLine::new(Body, l)));

    lines.push(DocLine::new(Heading, "Technical Skills:"));
    if !record.skills.is_empty() {
        lines.push(DocLine::new(Body, record.skills.join(", ")));
    }

    lines.push(DocLine::new(Heading, "Education:"));
    for edu in &record.education {
        let mut line = format!(
            "- {} at {} ({} - {})",
            edu.degree, edu.institution, edu.start_date, edu.end_date
        );
        if !edu.gpa.is_empty() {
            line.push_str(&format!(", GPA: {}", edu.gpa));
        }
        lines.push(DocLine::new(Body, line));
    }

    lines.push(DocLine::new(Heading, "Professional Experience:"));
    for exp in &record.experience {
        lines.push(DocLine::new(
            Body,
            format!(
                "- {} at {} ({} - {}), {}",
                exp.role, exp.company, exp.start_date, exp.end_date, exp.location
            ),
        ));
        for bullet in &exp.bullet_points {
            lines.push(DocLine::new(Bullet, format!("  • {bullet}")));
        }
    }

    lines.push(DocLine::new(Heading, "Publications:"));
    let p = &record.publication;
    if !p.is_empty() {
        lines.push(DocLine::new(
            Body,
            format!("- {} ({}, {}, {})", p.title, p.journal, p.volume, p.issue),
        ));
    }

    lines.push(DocLine::new(Heading, "Certifications:"));
    for cert in &record.certifications {
        lines.push(DocLine::new(
            Body,
            format!("- {} ({}, {})", cert.name, cert.issuer, cert.date),
        ));
    }

    lines
}

/// Turns a record into a downloadable payload.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderError>;

    /// File name offered to the user.
    fn file_name(&self) -> &str;

    fn media_type(&self) -> &str;
}

// ── Text ─────────────────────────────────────────────────────────────────────

/// The layout as UTF-8 text, one line per [`DocLine`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl DocumentRenderer for TextRenderer {
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderError> {
        let mut out = String::new();
        for line in document_lines(record) {
            out.push_str(&line.text);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn file_name(&self) -> &str {
        "resume.txt"
    }

    fn media_type(&self) -> &str {
        "text/plain; charset=utf-8"
    }
}

// ── PDF ──────────────────────────────────────────────────────────────────────

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MM: f32 = 280.0;
const BOTTOM_MM: f32 = 20.0;
const LEFT_MM: f32 = 20.0;
const BULLET_INDENT_MM: f32 = 6.0;
const WRAP_CHARS: usize = 90;

/// A4 PDF with Helvetica, paginated.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    title: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            title: "Resume".to_string(),
        }
    }
}

impl PdfRenderer {
    /// Renderer whose PDF metadata carries `title`.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, record: &ResumeRecord) -> Result<Vec<u8>, RenderError> {
        let (doc, page1, layer1) = PdfDocument::new(
            &self.title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;

        let mut layer = doc.get_page(page1).get_layer(layer1);
        let mut y = TOP_MM;
        let mut pages = 1;

        for line in document_lines(record) {
            let (size, step, gap_before, x, face) = match line.style {
                LineStyle::Title => (14.0, 7.0, 0.0, LEFT_MM, &bold),
                LineStyle::Heading => (11.0, 6.0, 4.0, LEFT_MM, &bold),
                LineStyle::Body => (10.0, 5.0, 0.0, LEFT_MM, &font),
                LineStyle::Bullet => (10.0, 5.0, 0.0, LEFT_MM + BULLET_INDENT_MM, &font),
            };
            y -= gap_before;

            for wrapped in wrap_text(&pdf_safe(&line.text), WRAP_CHARS) {
                if y < BOTTOM_MM {
                    let (page, layer_idx) =
                        doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                    layer = doc.get_page(page).get_layer(layer_idx);
                    y = TOP_MM;
                    pages += 1;
                }
                layer.use_text(wrapped, size, Mm(x), Mm(y), face);
                y -= step;
            }
        }
        debug!("Rendered PDF with {} pages", pages);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::Pdf(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| RenderError::Io(e.into_error()))
    }

    fn file_name(&self) -> &str {
        "resume.pdf"
    }

    fn media_type(&self) -> &str {
        "application/pdf"
    }
}

/// Map text onto what the builtin fonts can encode.
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '•' | '·' | '▪' | '●' => Some('-'),
            '–' | '—' | '‐' | '‑' => Some('-'),
            '‘' | '’' | '′' => Some('\''),
            '“' | '”' | '″' => Some('"'),
            '\u{00A0}' | '\t' => Some(' '),
            c if c.is_control() => None,
            c if (c as u32) < 0x100 => Some(c),
            _ => Some('?'),
        })
        .collect()
}

/// Greedy word wrap. Leading indentation is not preserved; callers indent by
/// x position instead.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Certification, Education, Experience, Publication};

    fn sample() -> ResumeRecord {
        ResumeRecord {
            name: "Jane Doe".into(),
            skills: vec!["Rust".into(), "Go".into()],
            education: vec![Education {
                institution: "MIT".into(),
                degree: "BSc".into(),
                start_date: "2014".into(),
                end_date: "2018".into(),
                gpa: "3.9".into(),
            }],
            experience: vec![Experience {
                company: "Acme".into(),
                role: "Engineer".into(),
                start_date: "2019".into(),
                end_date: "2021".into(),
                location: "Remote".into(),
                bullet_points: vec!["Shipped it".into()],
            }],
            publication: Publication {
                title: "Paper".into(),
                journal: "J".into(),
                volume: "1".into(),
                issue: "2".into(),
            },
            certifications: vec![Certification {
                name: "CKA".into(),
                issuer: "CNCF".into(),
                date: "2022".into(),
            }],
            ..Default::default()
        }
    }

    fn texts(record: &ResumeRecord) -> Vec<String> {
        document_lines(record).into_iter().map(|l| l.text).collect()
    }

    #[test]
    fn layout_lines() {
        let t = texts(&sample());
        assert_eq!(t[0], "Name: Jane Doe");
        assert!(t.contains(&"Rust, Go".to_string()));
        assert!(t.contains(&"- BSc at MIT (2014 - 2018), GPA: 3.9".to_string()));
        assert!(t.contains(&"- Engineer at Acme (2019 - 2021), Remote".to_string()));
        assert!(t.contains(&"  • Shipped it".to_string()));
        assert!(t.contains(&"- Paper (J, 1, 2)".to_string()));
        assert!(t.contains(&"- CKA (CNCF, 2022)".to_string()));
    }

    #[test]
    fn gpa_suffix_only_when_present() {
        let mut r = sample();
        r.education[0].gpa.clear();
        assert!(texts(&r).contains(&"- BSc at MIT (2014 - 2018)".to_string()));
    }

    #[test]
    fn default_record_keeps_every_heading() {
        let t = texts(&ResumeRecord::default());
        for heading in [
            "Contact Information:",
            "Professional Summary:",
            "Technical Skills:",
            "Education:",
            "Professional Experience:",
            "Publications:",
            "Certifications:",
        ] {
            assert!(t.contains(&heading.to_string()), "missing {heading}");
        }
        assert_eq!(t[0], "Name: ");
    }

    #[test]
    fn text_renderer_outputs_layout() {
        let bytes = TextRenderer.render(&sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Name: Jane Doe\n"));
        assert_eq!(TextRenderer.file_name(), "resume.txt");
    }

    #[test]
    fn pdf_renderer_handles_default_record() {
        let bytes = PdfRenderer::default().render(&ResumeRecord::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn pdf_renderer_paginates_long_records() {
        let mut r = sample();
        r.experience[0].bullet_points = (0..200).map(|i| format!("Bullet number {i}")).collect();
        let bytes = PdfRenderer::default().render(&r).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(PdfRenderer::default().file_name(), "resume.pdf");
    }

    #[test]
    fn pdf_safe_maps_typography() {
        assert_eq!(pdf_safe("  • a – b “c” 日本"), "  - a - b \"c\" ??");
        assert_eq!(pdf_safe("Zoë"), "Zoë");
    }

    #[test]
    fn wrap_splits_on_words() {
        let lines = wrap_text("aaa bbb ccc", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
