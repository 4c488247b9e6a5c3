//! Code fence info-string grammar.
//!
//! ```text
//! [>] lang [filename|uri] [#tag] [!directive] [key=value] [< source] [> format]
//! ```
//!
//! A leading `>` marks an output cell. ` < ` introduces a transclusion
//! source and ` > ` an output format. Tokens that fit no rule are ignored.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FenceMeta {
    pub lang: String,
    pub filename: Option<String>,
    pub uri: Option<String>,
    pub tags: Vec<String>,
    pub directives: Vec<String>,
    pub attrs: BTreeMap<String, String>,
    /// Transclusion reference after ` < `
    pub source: Option<String>,
    /// Format named after ` > `
    pub output_format: Option<String>,
    pub is_output_cell: bool,
    /// The info string as written
    pub raw: String,
}

impl FenceMeta {
    pub fn parse(info: &str) -> Self {
        let mut meta = FenceMeta {
            raw: info.to_string(),
            ..Default::default()
        };

        let mut rest = info.trim();
        if let Some(stripped) = rest.strip_prefix('>') {
            meta.is_output_cell = true;
            rest = stripped.trim_start();
        }
        let mut rest = rest.to_string();

        if let Some((left, right)) = split_unquoted(&rest, " < ") {
            let (head, tail) = split_source(right.trim());
            if !head.is_empty() {
                meta.source = Some(head.to_string());
            }
            rest = rejoin(left, tail);
        }

        if let Some((left, right)) = split_unquoted(&rest, " > ") {
            let right = right.trim();
            let (format, tail) = right.split_once(char::is_whitespace).unwrap_or((right, ""));
            if !format.is_empty() {
                meta.output_format = Some(format.to_string());
            }
            rest = rejoin(left, tail);
        }

        for (index, token) in tokenize(&rest).into_iter().enumerate() {
            if index == 0 {
                meta.lang = token;
                continue;
            }
            if let Some(tag) = token.strip_prefix('#').filter(|t| !t.is_empty()) {
                push_unique(&mut meta.tags, tag);
            } else if let Some(directive) = token.strip_prefix('!').filter(|d| !d.is_empty()) {
                push_unique(&mut meta.directives, directive);
            } else if let Some((key, value)) = token.split_once('=') {
                if !key.is_empty() {
                    meta.attrs.insert(key.to_string(), unquote(value).to_string());
                }
            } else if index == 1 {
                if token.contains("://") {
                    meta.uri = Some(token);
                } else {
                    meta.filename = Some(token);
                }
            }
        }

        meta
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d == name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }
}

/// `split_once` that ignores separators inside quoted runs
fn split_unquoted<'s>(input: &'s str, sep: &str) -> Option<(&'s str, &'s str)> {
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if input[i..].starts_with(sep) => {
                return Some((&input[..i], &input[i + sep.len()..]));
            }
            None => {}
        }
    }
    None
}

/// Split a source reference off the front of `right`: a `[[...]]` token, an
/// `<a ...>...</a>` anchor, or the first whitespace-delimited token.
fn split_source(right: &str) -> (&str, &str) {
    let end = if right.starts_with("[[") {
        right.find("]]").map(|i| i + 2)
    } else if right.starts_with("<a") {
        right.find("</a>").map(|i| i + 4)
    } else {
        None
    };
    let end = end.unwrap_or_else(|| right.find(char::is_whitespace).unwrap_or(right.len()));
    (&right[..end], right[end..].trim())
}

fn rejoin(left: &str, tail: &str) -> String {
    let left = left.trim();
    if tail.is_empty() {
        left.to_string()
    } else {
        format!("{} {}", left, tail.trim())
    }
}

/// Whitespace tokenizer that keeps quoted runs together
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                current.push(c);
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transclusion_with_filename_and_tag() {
        let meta = FenceMeta::parse("python sample.py < [[source-note]] #demo");
        assert_eq!(meta.lang, "python");
        assert_eq!(meta.filename.as_deref(), Some("sample.py"));
        assert_eq!(meta.tags, vec!["demo"]);
        assert_eq!(meta.source.as_deref(), Some("[[source-note]]"));
        assert!(!meta.is_output_cell);
        assert_eq!(meta.raw, "python sample.py < [[source-note]] #demo");
    }

    #[test]
    fn test_plain_language() {
        let meta = FenceMeta::parse("rust");
        assert_eq!(meta.lang, "rust");
        assert!(meta.filename.is_none());
        assert!(meta.source.is_none());

        assert_eq!(FenceMeta::parse("").lang, "");
    }

    #[test]
    fn test_output_cell_and_format() {
        let meta = FenceMeta::parse("> dot < diagrams/flow.dot > svg");
        assert!(meta.is_output_cell);
        assert_eq!(meta.lang, "dot");
        assert_eq!(meta.source.as_deref(), Some("diagrams/flow.dot"));
        assert_eq!(meta.output_format.as_deref(), Some("svg"));
    }

    #[test]
    fn test_format_before_source() {
        let meta = FenceMeta::parse("csv > json < data.csv #raw-data");
        assert_eq!(meta.lang, "csv");
        assert_eq!(meta.output_format.as_deref(), Some("json"));
        assert_eq!(meta.source.as_deref(), Some("data.csv"));
        assert_eq!(meta.tags, vec!["raw-data"]);
    }

    #[test]
    fn test_uri_in_second_position() {
        let meta = FenceMeta::parse("js https://example.com/a.js !inline");
        assert_eq!(meta.uri.as_deref(), Some("https://example.com/a.js"));
        assert!(meta.filename.is_none());
        assert!(meta.has_directive("inline"));
    }

    #[test]
    fn test_filename_only_in_second_position() {
        let meta = FenceMeta::parse("rust #tag later.rs");
        assert!(meta.filename.is_none());
        assert!(meta.has_tag("tag"));
    }

    #[test]
    fn test_attrs_strip_quotes() {
        let meta = FenceMeta::parse(r#"text viewer=timeline title="My history" height='3'"#);
        assert_eq!(meta.attr("viewer"), Some("timeline"));
        assert_eq!(meta.attr("title"), Some("My history"));
        assert_eq!(meta.attr("height"), Some("3"));
        assert!(meta.filename.is_none());
    }

    #[test]
    fn test_arrows_inside_quotes_are_attribute_text() {
        let meta = FenceMeta::parse(r#"text title="a < b" caption='x > y'"#);
        assert!(meta.source.is_none());
        assert!(meta.output_format.is_none());
        assert_eq!(meta.attr("title"), Some("a < b"));
        assert_eq!(meta.attr("caption"), Some("x > y"));

        let meta = FenceMeta::parse(r#"md title="a < b" < [[n]]"#);
        assert_eq!(meta.source.as_deref(), Some("[[n]]"));
        assert_eq!(meta.attr("title"), Some("a < b"));
    }

    #[test]
    fn test_duplicates_and_junk_are_tolerated() {
        let meta = FenceMeta::parse("py #a #a !x !x # ! =v stray");
        assert_eq!(meta.tags, vec!["a"]);
        assert_eq!(meta.directives, vec!["x"]);
        assert!(meta.attrs.is_empty());
    }

    #[test]
    fn test_anchor_source() {
        let meta = FenceMeta::parse(
            r#"md < <a href="/b.html" class="wikilink">b</a> !raw"#,
        );
        assert_eq!(
            meta.source.as_deref(),
            Some(r#"<a href="/b.html" class="wikilink">b</a>"#)
        );
        assert!(meta.has_directive("raw"));
    }

    #[test]
    fn test_section_source() {
        let meta = FenceMeta::parse("md < notes/setup.md#Install steps");
        assert_eq!(meta.source.as_deref(), Some("notes/setup.md#Install"));
    }
}
