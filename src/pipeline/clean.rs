//! Reply cleaning: deterministic cleanup of model output before JSON parsing.
//!
//! Even with "respond with the JSON object only" in the prompt, models
//! regularly wrap the object in a ```` ```json ```` fence, prepend a sentence
//! of boilerplate, or leak a BOM. These rules remove exactly that wrapping
//! and never touch the JSON itself.
//!
//! ## Rule Order
//!
//! Invisible characters go first so a BOM cannot hide the boilerplate
//! prefix; the prefix goes before the fence because models write the sentence
//! above the fence, never inside it.

use crate::prompts::REPLY_BOILERPLATE_PREFIX;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleaning rules to a raw model reply.
///
/// 1. Strip invisible Unicode (BOM, zero-width characters, soft hyphens)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip the boilerplate prefix, if present
/// 4. Strip an outer Markdown code fence
/// 5. Trim surrounding whitespace
pub fn clean_reply(raw: &str) -> String {
    let s = remove_invisible_chars(raw);
    let s = normalise_line_endings(&s);
    let s = strip_boilerplate_prefix(&s);
    let s = strip_code_fence(s);
    s.trim().to_string()
}

// ── Rule 1: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Strip the boilerplate prefix ─────────────────────────────────────

fn strip_boilerplate_prefix(input: &str) -> &str {
    let trimmed = input.trim_start();
    trimmed
        .strip_prefix(REPLY_BOILERPLATE_PREFIX)
        .unwrap_or(trimmed)
}

// ── Rule 4: Strip an outer code fence ────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").expect("valid fence regex")
});

fn strip_code_fence(input: &str) -> &str {
    let trimmed = input.trim();
    match RE_OUTER_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

// ── Fallback: first balanced object ──────────────────────────────────────────

/// Find the first balanced `{ ... }` substring.
///
/// Braces inside JSON strings (including escaped quotes) are ignored. Returns
/// `None` when no opening brace is ever closed.
pub fn first_json_object(input: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = input[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(&input[start..]) {
            return Some(&input[start..start + end]);
        }
        search_from = start + 1;
    }
    None
}

/// Byte length of the balanced object at the start of `s`, if it closes.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_invisible() {
        let input = "\u{FEFF}{\"Name\":\u{200B}\"A\"}";
        assert_eq!(clean_reply(input), "{\"Name\":\"A\"}");
    }

    #[test]
    fn test_strip_prefix() {
        let input = "Here is the extracted data in valid JSON format:\n{\"Name\": \"Jane\"}";
        assert_eq!(clean_reply(input), "{\"Name\": \"Jane\"}");
    }

    #[test]
    fn test_plain_json_unchanged() {
        let input = "{\"Name\": \"Jane\", \"Skills\": [\"Rust\"]}";
        assert_eq!(clean_reply(input), input);
    }

    #[test]
    fn test_strip_json_fence() {
        let input = "```json\n{\"Name\": \"Jane\"}\n```";
        assert_eq!(clean_reply(input), "{\"Name\": \"Jane\"}");
    }

    #[test]
    fn test_strip_bare_fence_with_crlf() {
        let input = "```\r\n{\"Name\": \"Jane\"}\r\n```\r\n";
        assert_eq!(clean_reply(input), "{\"Name\": \"Jane\"}");
    }

    #[test]
    fn test_prefix_then_fence() {
        let input = "Here is the extracted data in valid JSON format:\n\n```json\n{}\n```";
        assert_eq!(clean_reply(input), "{}");
    }

    #[test]
    fn test_inner_fence_is_kept() {
        let input = "{\"Summary\": \"uses ```code```\"}";
        assert_eq!(clean_reply(input), input);
    }

    #[test]
    fn test_first_object_in_prose() {
        let input = "Sure! {\"Name\": \"Jane\", \"Skills\": [\"a\"]} Hope that helps {x}";
        assert_eq!(
            first_json_object(input),
            Some("{\"Name\": \"Jane\", \"Skills\": [\"a\"]}")
        );
    }

    #[test]
    fn test_first_object_ignores_braces_in_strings() {
        let input = r#"note: {"Summary": "likes } and { and \"quotes\""} trailing"#;
        assert_eq!(
            first_json_object(input),
            Some(r#"{"Summary": "likes } and { and \"quotes\""}"#)
        );
    }

    #[test]
    fn test_first_object_nested() {
        let input = "x {\"a\": {\"b\": {}}} y";
        assert_eq!(first_json_object(input), Some("{\"a\": {\"b\": {}}}"));
    }

    #[test]
    fn test_first_object_unbalanced() {
        assert_eq!(first_json_object("{\"Name\": \"Jane\""), None);
        assert_eq!(first_json_object("no braces"), None);
    }

    #[test]
    fn test_first_object_skips_unclosed_brace() {
        assert_eq!(
            first_json_object("{ oops { \"a\": 1 }"),
            Some("{ \"a\": 1 }")
        );
        assert_eq!(first_json_object("} {\"a\": 1}"), Some("{\"a\": 1}"));
    }
}
