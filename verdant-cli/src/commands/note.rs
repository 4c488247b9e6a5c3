//! Fetch a single compiled record in structured form.

use super::GardenSource;
use crate::NoteFormat;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use verdant_core::{LogPageRecord, PageRecord, SiteIndex, StubRecord};

#[derive(Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "lowercase")]
enum Found<'a> {
    Page(&'a PageRecord),
    Stub(&'a StubRecord),
    Log(&'a LogPageRecord),
}

pub fn show_note(source: &GardenSource, slug: &str, format: NoteFormat) -> Result<()> {
    let index = source.build()?;
    let found = find(&index, slug)
        .with_context(|| format!("No page, stub, or log page for '{}'", slug))?;

    match format {
        NoteFormat::Json => println!("{}", serde_json::to_string_pretty(&found)?),
        NoteFormat::Html => match found {
            Found::Page(page) => println!("{}", page.html),
            Found::Log(log) => println!("{}", log.html.as_deref().unwrap_or_default()),
            Found::Stub(stub) => bail!("'{}' is a stub and has no body", stub.slug),
        },
        NoteFormat::Frontmatter => match found {
            Found::Page(page) => print!("{}", page.metadata.to_block()),
            _ => bail!("'{}' has no frontmatter", slug),
        },
    }

    Ok(())
}

fn normalize_slugish(s: &str) -> &str {
    let trimmed = s.trim().trim_matches('/');
    trimmed.strip_suffix(".html").unwrap_or(trimmed)
}

fn find<'a>(index: &'a SiteIndex, query: &str) -> Option<Found<'a>> {
    let slug = normalize_slugish(query);
    index
        .find_page(slug)
        .map(Found::Page)
        .or_else(|| index.find_log(slug).map(Found::Log))
        .or_else(|| index.find_stub(slug).map(Found::Stub))
}
