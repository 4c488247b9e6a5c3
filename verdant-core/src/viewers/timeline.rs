//! `timeline` viewer: `2024-01-15: something happened` lines as a timeline.

use crate::fence::FenceMeta;
use crate::markdown::html_escape;
use regex::Regex;
use std::sync::OnceLock;

static EVENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn event_regex() -> &'static Regex {
    EVENT_REGEX.get_or_init(|| Regex::new(r"^(\d{4}(?:-\d{2})?(?:-\d{2})?)[:\s]+(.+)$").unwrap())
}

pub fn render(content: &str, _meta: &FenceMeta) -> String {
    let events: Vec<(&str, &str)> = content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let caps = event_regex().captures(line)?;
            Some((caps.get(1)?.as_str(), caps.get(2)?.as_str().trim()))
        })
        .collect();

    if events.is_empty() {
        return "<p class=\"timeline-empty\">No timeline events found</p>\n".to_string();
    }

    let mut html = String::from("<div class=\"timeline-viewer\">");
    for (date, text) in events {
        html.push_str(&format!(
            "<div class=\"timeline-event\"><span class=\"timeline-date\">{}</span><span class=\"timeline-text\">{}</span></div>",
            date,
            html_escape(text)
        ));
    }
    html.push_str("</div>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_events() {
        let html = render(
            "2024-01-15: Planted the garden\nnot an event\n2024 First <harvest>\n",
            &FenceMeta::default(),
        );
        assert_eq!(html.matches("timeline-event").count(), 2);
        assert!(html.contains("<span class=\"timeline-date\">2024-01-15</span>"));
        assert!(html.contains("<span class=\"timeline-text\">Planted the garden</span>"));
        assert!(html.contains("First &lt;harvest&gt;"));
    }

    #[test]
    fn test_timeline_without_events() {
        assert!(render("", &FenceMeta::default()).contains("timeline-empty"));
    }
}
