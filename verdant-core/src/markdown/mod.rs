//! Markdown rendering: wikilinks, heading ids, and fence expansion layered
//! over pulldown-cmark.

pub mod fences;
pub mod highlight;

use crate::builder::BuildContext;
use crate::models::Diagnostic;
use crate::slug::slugify;
use fences::FenceTransformer;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

pub use highlight::highlight_code;

/// Where a render happens: the note whose body is being rendered and how
/// deep inside transclusions it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderScope {
    /// Note the content belongs to; relative transclusion paths start here
    pub slug: String,
    pub depth: usize,
    /// Only top-level page renders place backlink anchors
    pub assign_anchors: bool,
}

impl RenderScope {
    pub fn page(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            depth: 0,
            assign_anchors: true,
        }
    }

    /// Scope for content transcluded into this one
    pub fn nested(&self, slug: Option<&str>) -> Self {
        Self {
            slug: slug.map(str::to_string).unwrap_or_else(|| self.slug.clone()),
            depth: self.depth + 1,
            assign_anchors: false,
        }
    }
}

/// Markdown processor with wikilink and fence extensions
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

        Self { options }
    }

    /// Render a note body (frontmatter already stripped) to HTML.
    ///
    /// Recoverable problems such as failed transclusions are pushed onto
    /// `diagnostics`; the returned HTML carries a visible placeholder.
    pub fn render(
        &self,
        body: &str,
        ctx: &BuildContext,
        scope: &RenderScope,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let converted = ctx.wikilinks().convert(body, scope.assign_anchors);

        let parser = Parser::new_ext(&converted, self.options);
        let events: Vec<Event> = parser.collect();

        let headings = collect_headings(&events);
        let events = attach_heading_ids(events, &headings);

        let fences = FenceTransformer::new(self, ctx, scope);
        let events = fences.transform(events, diagnostics);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_headings(events: &[Event]) -> Vec<String> {
    let mut ids = Vec::new();
    let mut current: Option<String> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                current = Some(String::new());
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(ref mut title) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(title) = current.take() {
                    ids.push(slugify(&title));
                }
            }
            _ => {}
        }
    }

    ids
}

fn attach_heading_ids<'a>(events: Vec<Event<'a>>, ids: &[String]) -> Vec<Event<'a>> {
    let mut id_iter = ids.iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                mut id,
                classes,
                attrs,
            }) => {
                let next = id_iter.next();
                if id.is_none() {
                    id = next
                        .filter(|slug| !slug.is_empty())
                        .map(|slug| CowStr::Boxed(slug.clone().into_boxed_str()));
                }
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            other => result.push(other),
        }
    }

    result
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildContext;

    fn render(body: &str) -> String {
        let ctx = BuildContext::for_tests(&["b"]);
        let mut diagnostics = Vec::new();
        MarkdownProcessor::new().render(body, &ctx, &RenderScope::page("a"), &mut diagnostics)
    }

    #[test]
    fn test_basic_markdown() {
        let html = render("# Hello World\n\nThis is a **test**.");
        assert!(html.contains("<h1 id=\"hello-world\">Hello World</h1>"));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_tables() {
        let md = r#"
| Header 1 | Header 2 |
|----------|----------|
| Cell 1   | Cell 2   |
"#;
        let html = render(md);
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Header 1</th>"));
    }

    #[test]
    fn test_wikilinks_become_anchors() {
        let html = render("See [[b]] and [[ghost]].");
        assert!(html.contains(r#"<a href="/b.html" class="wikilink" id="ref-b">b</a>"#));
        assert!(html.contains(r#"class="wikilink broken""#));
    }

    #[test]
    fn test_inline_code_keeps_brackets() {
        let html = render("Write `[[b]]` to link.");
        assert!(html.contains("<code>[[b]]</code>"));
        assert!(!html.contains("wikilink"));
    }

    #[test]
    fn test_indented_code_keeps_brackets() {
        let html = render("para\n\n    let x = [[b]];\n\nSee [[b]].\n");
        assert!(html.contains("<pre><code>let x = [[b]];"));
        assert!(!html.contains("&lt;a"));
        assert_eq!(html.matches(r#"id="ref-b""#).count(), 1);
        assert!(html.contains(r#"<a href="/b.html" class="wikilink" id="ref-b">b</a>"#));
    }

    #[test]
    fn test_explicit_heading_id_wins() {
        let html = render("## Setup {#custom}\n");
        assert!(html.contains("id=\"custom\""));
    }

    #[test]
    fn test_escape() {
        assert_eq!(html_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }
}
