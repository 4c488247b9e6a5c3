//! Slug derivation: note identifiers, heading ids, and link anchors.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

static HYPHEN_RUNS: OnceLock<Regex> = OnceLock::new();

fn hyphen_runs() -> &'static Regex {
    HYPHEN_RUNS.get_or_init(|| Regex::new(r"-+").unwrap())
}

/// Convert a heading or section name to a URL-safe fragment.
///
/// Rules:
/// - Lowercase
/// - Replace whitespace and underscores with hyphens
/// - Remove special characters (except hyphens)
/// - Collapse multiple hyphens
/// - Trim leading/trailing hyphens
///
/// # Examples
///
/// ```
/// use verdant_core::slugify;
///
/// assert_eq!(slugify("Hello World"), "hello-world");
/// assert_eq!(slugify("Rust & Safety"), "rust-safety");
/// assert_eq!(slugify("C++ Programming"), "c-programming");
/// ```
pub fn slugify(input: &str) -> String {
    let lowercased = input.to_lowercase();

    let with_hyphens = lowercased
        .graphemes(true)
        .map(|g| match g {
            " " | "_" | "\t" | "\n" => "-",
            _ => g,
        })
        .collect::<String>();

    let cleaned = with_hyphens
        .graphemes(true)
        .filter(|g| {
            g.chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric() || c == '-' || c.is_alphabetic())
                .unwrap_or(false)
        })
        .collect::<String>();

    let collapsed = hyphen_runs().replace_all(&cleaned, "-");
    collapsed.trim_matches('-').to_string()
}

/// Derive a note slug from its path relative to the content root.
///
/// The extension is stripped and separators are normalized to `/`.
/// Returns `None` for paths that do not sit under `root`.
pub fn slug_from_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let stem = rel.with_extension("");
    let parts: Vec<String> = stem
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Final path segment of a slug (`notes/rust` -> `rust`).
pub fn basename(slug: &str) -> &str {
    slug.rsplit('/').next().unwrap_or(slug)
}

/// Directory part of a slug, if any (`notes/rust` -> `notes`).
pub fn parent_dir(slug: &str) -> Option<&str> {
    slug.rsplit_once('/').map(|(dir, _)| dir)
}

/// Anchor id placed on the first wikilink to `target` inside a note.
///
/// Every non-alphanumeric character of the target becomes `-`, so the id
/// is stable across builds and valid inside an HTML `id` attribute.
pub fn anchor_id(target: &str) -> String {
    let body: String = target
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    format!("ref-{}", body)
}
