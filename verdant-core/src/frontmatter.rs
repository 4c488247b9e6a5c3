//! Frontmatter parsing from markdown files.

use crate::models::Metadata;
use regex::Regex;
use std::sync::OnceLock;

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)(.*)\z").unwrap()
    })
}

/// Split a note into metadata and body.
///
/// The block between two `---` lines is read as `key: value` pairs. The first
/// colon separates key from value; lines without one are skipped. If the text
/// does not open with a frontmatter block the whole text is the body.
///
/// # Example
///
/// ```
/// use verdant_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Note\ncreated: 2024-03-05\n---\n# Hello\n";
///
/// let (meta, body) = parse_frontmatter(content);
/// assert_eq!(meta.title(), Some("My Note"));
/// assert_eq!(meta.created(), Some("2024-03-05"));
/// assert_eq!(body, "# Hello\n");
/// ```
pub fn parse_frontmatter(content: &str) -> (Metadata, String) {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return (Metadata::default(), content.to_string());
    };

    let block = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or("");

    (parse_block(block), body.to_string())
}

/// Body only, frontmatter stripped
pub fn strip_frontmatter(content: &str) -> String {
    parse_frontmatter(content).1
}

fn parse_block(block: &str) -> Metadata {
    let mut metadata = Metadata::new();
    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        metadata.insert(key, value.trim());
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_frontmatter() {
        let content = r#"---
title: Test Note
status: budding
created: 2024-03-05
updated: 2024-04-01
---

# Hello World

This is the content."#;

        let (meta, body) = parse_frontmatter(content);
        assert_eq!(meta.title(), Some("Test Note"));
        assert_eq!(meta.get("status"), Some("budding"));
        assert_eq!(meta.created(), Some("2024-03-05"));
        assert_eq!(meta.updated(), Some("2024-04-01"));
        assert!(body.starts_with("\n# Hello World"));
        assert!(body.contains("This is the content."));
    }

    #[test]
    fn test_value_keeps_later_colons() {
        let content = "---\ntitle: Time: a reflection\nsource: https://example.com\n---\nbody";
        let (meta, body) = parse_frontmatter(content);
        assert_eq!(meta.title(), Some("Time: a reflection"));
        assert_eq!(meta.get("source"), Some("https://example.com"));
        assert_eq!(body, "body");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let content = "---\ntitle: Ok\nthis line has no colon\n: empty key\n---\nbody\n";
        let (meta, _) = parse_frontmatter(content);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.title(), Some("Ok"));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just Content\n\nNo frontmatter here.";
        let (meta, body) = parse_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_delimiter_must_open_the_file() {
        let content = "intro\n---\ntitle: nope\n---\n";
        let (meta, body) = parse_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_unclosed_block_is_body() {
        let content = "---\ntitle: never closed\n";
        let (meta, body) = parse_frontmatter(content);
        assert!(meta.is_empty());
        assert_eq!(body, content);
    }

    #[test]
    fn test_empty_block_and_closing_at_eof() {
        let (meta, body) = parse_frontmatter("---\n---\nbody");
        assert!(meta.is_empty());
        assert_eq!(body, "body");

        let (meta, body) = parse_frontmatter("---\ntitle: Only meta\n---");
        assert_eq!(meta.title(), Some("Only meta"));
        assert_eq!(body, "");
    }

    #[test]
    fn test_crlf_line_endings() {
        let (meta, body) = parse_frontmatter("---\r\ntitle: Windows\r\n---\r\nbody\r\n");
        assert_eq!(meta.title(), Some("Windows"));
        assert_eq!(body, "body\r\n");
    }

    #[test]
    fn test_round_trip_known_keys() {
        let content = "---\ntitle: Garden\nstatus: evergreen\ncreated: 2024-03-05\n---\nbody\n";
        let (meta, body) = parse_frontmatter(content);
        let rebuilt = format!("{}{}", meta.to_block(), body);
        let (again, again_body) = parse_frontmatter(&rebuilt);
        assert_eq!(again, meta);
        assert_eq!(again_body, body);
    }
}
