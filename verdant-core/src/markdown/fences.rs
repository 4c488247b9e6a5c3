//! Fenced code block expansion: transclusion, then viewer dispatch or
//! highlighting.

use super::highlight::{highlight_code, plain_code};
use super::{MarkdownProcessor, RenderScope};
use crate::builder::BuildContext;
use crate::fence::FenceMeta;
use crate::models::Diagnostic;
use crate::transclude::{cite, TranscludeError, TranscludeTarget, MAX_DEPTH};
use crate::viewers::{client_placeholder, select_viewer, Viewer};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};

/// Replaces every fenced code block with rendered HTML
pub struct FenceTransformer<'a> {
    processor: &'a MarkdownProcessor,
    ctx: &'a BuildContext,
    scope: &'a RenderScope,
}

impl<'a> FenceTransformer<'a> {
    pub fn new(processor: &'a MarkdownProcessor, ctx: &'a BuildContext, scope: &'a RenderScope) -> Self {
        Self {
            processor,
            ctx,
            scope,
        }
    }

    /// Transform events, expanding fenced blocks. Indented blocks pass through.
    pub fn transform<'e>(
        &self,
        events: Vec<Event<'e>>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Event<'e>> {
        let mut result = Vec::with_capacity(events.len());
        let mut fence: Option<(String, String)> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    fence = Some((info.to_string(), String::new()));
                }
                Event::Text(text) if fence.is_some() => {
                    if let Some((_, content)) = fence.as_mut() {
                        content.push_str(text.as_ref());
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some((info, content)) = fence.take() {
                        let html = self.render_fence(&info, &content, diagnostics);
                        result.push(Event::Html(CowStr::Boxed(html.into_boxed_str())));
                    }
                }
                other => result.push(other),
            }
        }

        result
    }

    fn render_fence(&self, info: &str, content: &str, diagnostics: &mut Vec<Diagnostic>) -> String {
        let meta = FenceMeta::parse(info);

        let mut body = content.to_string();
        let mut note_source: Option<TranscludeTarget> = None;

        if let Some(source) = meta.source.as_deref() {
            match self.transclude(source) {
                Ok(Some((target, text))) => {
                    body = text;
                    if target.is_note_slug {
                        note_source = Some(target);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!("{}: {}", self.scope.slug, err);
                    diagnostics.push(
                        Diagnostic::warning(err.code(), err.to_string(), Some(&self.scope.slug))
                            .with_context(source),
                    );
                    return err.placeholder(source);
                }
            }
        }

        let viewer = select_viewer(&meta, note_source.is_some());
        let nested_slug = note_source.as_ref().map(|t| t.path.as_str());
        let html = self.dispatch(viewer.as_deref(), &body, &meta, nested_slug, diagnostics);

        match note_source {
            Some(target) => {
                let href = self
                    .ctx
                    .wikilinks()
                    .href(&target.path, target.section.as_deref());
                cite(&html, &target, &href)
            }
            None => html,
        }
    }

    fn transclude(&self, source: &str) -> Result<Option<(TranscludeTarget, String)>, TranscludeError> {
        let Some(mut target) = TranscludeTarget::classify(source) else {
            return Ok(None);
        };
        if target.is_note_slug {
            target.path = self.ctx.resolver.resolve(&target.path);
        }
        if self.scope.depth >= MAX_DEPTH {
            return Err(TranscludeError::TooDeep(target.label()));
        }
        let text = self.ctx.transcluder().load(&target, &self.scope.slug)?;
        Ok(Some((target, text)))
    }

    fn dispatch(
        &self,
        viewer: Option<&str>,
        content: &str,
        meta: &FenceMeta,
        nested_slug: Option<&str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let Some(name) = viewer else {
            let lang = meta.output_format.as_deref().unwrap_or(&meta.lang);
            return highlight_code(content, lang);
        };

        match self.ctx.viewers.get(name) {
            Some(Viewer::Build(transform)) => transform(content, meta),
            Some(Viewer::Markdown) => {
                let scope = self.scope.nested(nested_slug);
                self.processor.render(content, self.ctx, &scope, diagnostics)
            }
            Some(Viewer::Client(client)) => client_placeholder(client, content),
            None => {
                tracing::debug!("unknown viewer '{}', rendering as code", name);
                if meta.lang.is_empty() {
                    plain_code(content, "")
                } else {
                    highlight_code(content, &meta.lang)
                }
            }
        }
    }
}
