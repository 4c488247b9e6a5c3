//! `toc` viewer: a table of contents built from the fence's headings.

use crate::fence::FenceMeta;
use crate::markdown::html_escape;
use crate::slug::slugify;
use regex::Regex;
use std::sync::OnceLock;

static HEADING_REGEX: OnceLock<Regex> = OnceLock::new();

fn heading_regex() -> &'static Regex {
    HEADING_REGEX.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap())
}

pub fn render(content: &str, _meta: &FenceMeta) -> String {
    let headings: Vec<(usize, &str)> = content
        .lines()
        .filter_map(|line| {
            let caps = heading_regex().captures(line)?;
            Some((caps.get(1)?.as_str().len(), caps.get(2)?.as_str().trim()))
        })
        .collect();

    let Some(min_level) = headings.iter().map(|(level, _)| *level).min() else {
        return "<p class=\"toc-empty\">No headings found</p>\n".to_string();
    };

    let mut html = String::from("<nav class=\"toc-viewer\"><ul>");
    for (level, text) in &headings {
        let indent = level - min_level;
        let padding = if indent > 0 {
            format!(" style=\"padding-left: {}em\"", indent)
        } else {
            String::new()
        };
        html.push_str(&format!(
            "<li{}><a href=\"#{}\">{}</a></li>",
            padding,
            slugify(text),
            html_escape(text)
        ));
    }
    html.push_str("</ul></nav>\n");
    html
}
