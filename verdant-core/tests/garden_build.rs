use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use verdant_core::{Config, GardenBuilder, LinkKind, LogPeriod, SiteIndex};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write(root: &Path, rel: &str, content: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn build(root: &Path) -> Result<SiteIndex, Box<dyn std::error::Error>> {
    let mut config = Config::for_content_dir(root);
    config.today = NaiveDate::from_ymd_opt(2024, 3, 5);
    Ok(GardenBuilder::new(config).build()?)
}

#[test]
fn link_produces_backlink_and_no_missing() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "a.md", "[[b]]\n")?;
    write(dir.path(), "b.md", "no frontmatter here\n")?;

    let index = build(dir.path())?;

    let b = index.find_page("b").ok_or("page b")?;
    assert_eq!(b.backlinks.len(), 1);
    assert_eq!(b.backlinks[0].slug, "a");
    assert_eq!(b.backlinks[0].href, "/a.html#ref-b");
    assert!(index.missing.is_empty());
    assert!(index.stubs.is_empty());

    let a = index.find_page("a").ok_or("page a")?;
    assert!(a.html.contains(r#"id="ref-b""#));
    Ok(())
}

#[test]
fn repeated_links_yield_one_backlink() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "a.md", "[[b|first]] and [[b]] and again [[b#Part]]\n")?;
    write(dir.path(), "b.md", "# Part\n")?;

    let index = build(dir.path())?;
    let b = index.find_page("b").ok_or("page b")?;
    assert_eq!(b.backlinks.len(), 1);
    assert_eq!(b.backlinks[0].link_text.as_deref(), Some("first"));

    let a = index.find_page("a").ok_or("page a")?;
    assert_eq!(a.html.matches(r#"id="ref-b""#).count(), 1);
    Ok(())
}

#[test]
fn ghost_link_becomes_stub() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "a.md", "See [[ghost]].\n")?;

    let index = build(dir.path())?;

    assert_eq!(index.missing.iter().collect::<Vec<_>>(), vec!["ghost"]);
    let a = index.find_page("a").ok_or("page a")?;
    assert!(a.html.contains(r#"href="/ghost.html" class="wikilink broken""#));

    let stub = index.find_stub("ghost").ok_or("stub")?;
    assert_eq!(stub.backlinks.len(), 1);
    assert_eq!(stub.backlinks[0].slug, "a");
    assert!(stub.disambiguation.is_none());
    assert!(index.diagnostics.iter().any(|d| d.code == "link.broken"));
    Ok(())
}

#[test]
fn shared_basename_gets_disambiguation() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "x/note.md", "---\ntitle: X\n---\nx\n")?;
    write(dir.path(), "y/note.md", "y\n")?;
    write(dir.path(), "c.md", "[[note]]\n")?;

    let index = build(dir.path())?;

    assert_eq!(
        index.collisions.candidates("note"),
        Some(&["x/note".to_string(), "y/note".to_string()][..])
    );
    let stub = index.find_stub("note").ok_or("stub")?;
    let choice = stub.disambiguation.as_ref().ok_or("disambiguation")?;
    let candidates: Vec<&str> = choice.candidates.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(candidates, vec!["x/note", "y/note"]);
    Ok(())
}

#[test]
fn fence_transclusion_renders_source_note() -> TestResult {
    let dir = TempDir::new()?;
    write(
        dir.path(),
        "source-note.md",
        "---\ntitle: Source\n---\nShared **content**.\n",
    )?;
    write(
        dir.path(),
        "page.md",
        "Intro\n\n```python sample.py < [[source-note]] #demo\nplaceholder\n```\n",
    )?;

    let index = build(dir.path())?;

    let page = index.find_page("page").ok_or("page")?;
    assert!(page.html.contains("<strong>content</strong>"));
    assert!(!page.html.contains("title: Source"));
    assert!(page.html.contains("class=\"transclusion-source\""));

    // transclusion counts as a link for backlinks
    let source = index.find_page("source-note").ok_or("source")?;
    assert_eq!(source.backlinks[0].slug, "page");
    assert!(index.diagnostics.is_empty());
    Ok(())
}

#[test]
fn transclusion_failures_are_visible() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "b.md", "# Only\n")?;
    write(
        dir.path(),
        "page.md",
        "```text < missing.txt\n```\n\n```md < [[b#Absent]]\n```\n",
    )?;

    let index = build(dir.path())?;
    let page = index.find_page("page").ok_or("page")?;
    assert!(page.html.contains("transclusion-failed"));
    assert!(page.html.contains("transclusion-missing-section"));

    let codes: Vec<&str> = index.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert!(codes.contains(&"transclude.failed"));
    assert!(codes.contains(&"transclude.section-missing"));
    Ok(())
}

#[test]
fn file_transclusion_with_section() -> TestResult {
    let dir = TempDir::new()?;
    write(
        dir.path(),
        "guides/setup.md",
        "# Setup\n## Install\nrun it\n## Configure\nedit it\n",
    )?;
    write(dir.path(), "guides/index.md", "```md !inline < setup.md#install\n```\n")?;

    let index = build(dir.path())?;
    let page = index.find_page("guides/index").ok_or("page")?;
    assert!(page.html.contains("run it"));
    assert!(!page.html.contains("edit it"));
    Ok(())
}

#[test]
fn created_date_fills_all_period_buckets() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "a.md", "---\ncreated: 2024-03-05\nupdated: 2024-04-02\n---\nbody\n")?;
    write(dir.path(), "b.md", "---\ncreated: not-a-date\n---\nbody\n")?;

    let index = build(dir.path())?;

    for (slug, period) in [
        ("log/2024-03-05", LogPeriod::Day),
        ("log/2024-w10", LogPeriod::Week),
        ("log/2024-03", LogPeriod::Month),
        ("log/2024", LogPeriod::Year),
    ] {
        let log = index.find_log(slug).ok_or(slug)?;
        assert_eq!(log.period, period);
        assert_eq!(log.created.len(), 1, "{}", slug);
        assert_eq!(log.created[0].slug, "a");
    }

    let april = index.find_log("log/2024-04").ok_or("april")?;
    assert_eq!(april.updated[0].slug, "a");
    assert!(april.created.is_empty());

    let year = index.find_log("log/2024").ok_or("year")?;
    let months: Vec<&str> = year.children.iter().map(|c| c.slug.as_str()).collect();
    assert_eq!(months, vec!["log/2024-03", "log/2024-04"]);
    Ok(())
}

#[test]
fn relative_date_links_resolve_to_log_pages() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "journal.md", "[[today]] [[last-week]] [[recent]]\n")?;

    let index = build(dir.path())?;
    let page = index.find_page("journal").ok_or("journal")?;
    assert!(page.html.contains(r#"href="/log/2024-03-05.html" class="wikilink""#));
    assert!(page.html.contains(r#"href="/log/2024-w09.html""#));
    assert!(!page.html.contains("broken"));
    assert!(index.missing.is_empty());

    let today = index.find_log("log/2024-03-05").ok_or("today")?;
    assert_eq!(today.backlinks[0].slug, "journal");
    Ok(())
}

#[test]
fn code_is_never_link_converted() -> TestResult {
    let dir = TempDir::new()?;
    write(
        dir.path(),
        "a.md",
        "Inline `[[ghost]]` code.\n\n```\n[[other-ghost]]\n```\n",
    )?;

    let index = build(dir.path())?;
    let a = index.find_page("a").ok_or("a")?;
    assert!(!a.html.contains("wikilink"));
    assert!(a.html.contains("[[ghost]]"));
    assert!(index.missing.is_empty());
    Ok(())
}

#[test]
fn backlink_anchor_skips_indented_code() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "a.md", "para\n\n    let x = [[b]];\n\nSee [[b]].\n")?;
    write(dir.path(), "b.md", "b\n")?;

    let index = build(dir.path())?;
    let b = index.find_page("b").ok_or("b")?;
    assert_eq!(b.backlinks[0].href, "/a.html#ref-b");

    let a = index.find_page("a").ok_or("a")?;
    assert!(a.html.contains("<pre><code>let x = [[b]];"));
    assert!(a.html.contains(r#"class="wikilink" id="ref-b">b</a>"#));
    Ok(())
}

#[test]
fn links_are_recorded_in_order_with_kinds() -> TestResult {
    let dir = TempDir::new()?;
    write(dir.path(), "src.md", "source\n")?;
    write(
        dir.path(),
        "a.md",
        "```md < [[src]]\n```\n\n[[b]] then [[c]]\n",
    )?;
    write(dir.path(), "b.md", "")?;
    write(dir.path(), "c.md", "")?;

    let mut config = Config::for_content_dir(dir.path());
    config.today = NaiveDate::from_ymd_opt(2024, 3, 5);
    let index = GardenBuilder::new(config).build()?;
    let json: serde_json::Value = serde_json::from_str(&index.to_json(false)?)?;
    assert_eq!(json["slugs"], serde_json::json!(["a", "b", "c", "src"]));

    let links = verdant_core::wikilinks::extract_links(
        "```md < [[src]]\n```\n\n[[b]] then [[c]]\n",
        &verdant_core::VirtualSlugResolver::new(
            NaiveDate::from_ymd_opt(2024, 3, 5).ok_or("date")?,
            "log",
        ),
    );
    let kinds: Vec<(&str, LinkKind)> = links.iter().map(|l| (l.target.as_str(), l.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("b", LinkKind::Inline),
            ("c", LinkKind::Inline),
            ("src", LinkKind::Transclusion)
        ]
    );
    Ok(())
}

#[test]
fn missing_root_aborts_build() {
    let config = Config::for_content_dir("/definitely/not/here/verdant");
    assert!(GardenBuilder::new(config).build().is_err());
}
