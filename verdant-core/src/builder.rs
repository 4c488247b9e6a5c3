//! Garden building logic: scan, parse, index, render, assemble.

use crate::{
    assemble::PageAssembler,
    collisions::SlugCollisions,
    config::Config,
    frontmatter::parse_frontmatter,
    graph::LinkGraph,
    markdown::{MarkdownProcessor, RenderScope},
    models::*,
    slug::slug_from_path,
    temporal::LogIndex,
    transclude::Transcluder,
    viewers::ViewerRegistry,
    virtual_slugs::VirtualSlugResolver,
    wikilinks::{extract_links, WikilinkRenderer},
};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Content root {path:?} is not a readable directory: {source}")]
    ContentRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Everything rendering needs to know about the build, shared read-only
/// by every page render.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub content_root: PathBuf,
    /// Every note slug in the garden
    pub known: HashSet<String>,
    /// Note bodies by slug, frontmatter stripped
    pub bodies: HashMap<String, String>,
    pub resolver: VirtualSlugResolver,
    pub viewers: ViewerRegistry,
    /// Normalized, with leading and trailing slash
    pub base_url: String,
}

impl BuildContext {
    pub fn wikilinks(&self) -> WikilinkRenderer<'_> {
        WikilinkRenderer::new(&self.known, &self.resolver, &self.base_url)
    }

    pub fn transcluder(&self) -> Transcluder<'_> {
        Transcluder::new(&self.content_root, &self.bodies)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(slugs: &[&str]) -> Self {
        Self {
            content_root: std::env::temp_dir(),
            known: slugs.iter().map(|s| s.to_string()).collect(),
            bodies: HashMap::new(),
            resolver: VirtualSlugResolver::new(
                chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                "log",
            ),
            viewers: ViewerRegistry::with_builtins(),
            base_url: "/".to_string(),
        }
    }
}

/// Main garden builder
pub struct GardenBuilder {
    config: Config,
    processor: MarkdownProcessor,
}

impl GardenBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            processor: MarkdownProcessor::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the whole garden.
    ///
    /// Only an unreadable content root is fatal. Unreadable notes are logged
    /// and skipped; broken links and failed transclusions become diagnostics.
    pub fn build(&self) -> Result<SiteIndex, BuildError> {
        let root = self.config.content_dir();
        check_content_root(&root)?;

        let files = self.discover_note_files(&root);
        tracing::info!("Found {} markdown files", files.len());

        let resolver = VirtualSlugResolver::new(self.config.build_date(), self.config.log_prefix());

        let mut notes = Vec::new();
        for path in &files {
            match parse_note(&root, path, &resolver) {
                Ok(Some(note)) => notes.push(note),
                Ok(None) => tracing::debug!("Skipping {:?}: no slug", path),
                Err(e) => {
                    tracing::error!("Failed to read {:?}: {}", path, e);
                    // Continue with other files
                }
            }
        }
        notes.sort_by(|a, b| a.slug.cmp(&b.slug));

        let known: HashSet<String> = notes.iter().map(|n| n.slug.clone()).collect();
        let graph = LinkGraph::build(&notes, &known, &resolver);
        let collisions = SlugCollisions::build(notes.iter().map(|n| n.slug.as_str()));
        let logs = LogIndex::build(&notes);
        tracing::info!(
            "Indexed {} notes: {} missing targets, {} basename collisions, {} active periods",
            notes.len(),
            graph.missing.len(),
            collisions.len(),
            logs.periods.len()
        );

        let ctx = BuildContext {
            content_root: root,
            known,
            bodies: notes
                .iter()
                .map(|n| (n.slug.clone(), n.body.clone()))
                .collect(),
            resolver,
            viewers: self.viewer_registry(),
            base_url: self.config.normalized_base_url(),
        };

        let mut diagnostics = Vec::new();
        let rendered: HashMap<String, String> = notes
            .iter()
            .map(|note| {
                let scope = RenderScope::page(note.slug.as_str());
                let html = self
                    .processor
                    .render(&note.body, &ctx, &scope, &mut diagnostics);
                (note.slug.clone(), html)
            })
            .collect();

        let assembler = PageAssembler {
            notes: &notes,
            graph: &graph,
            collisions: &collisions,
            logs: &logs,
            resolver: &ctx.resolver,
            base_url: &ctx.base_url,
        };
        let index = assembler.assemble(rendered, diagnostics);

        tracing::info!(
            "Built {} pages, {} stubs, {} log pages ({} diagnostics)",
            index.pages.len(),
            index.stubs.len(),
            index.logs.len(),
            index.diagnostics.len()
        );

        Ok(index)
    }

    fn viewer_registry(&self) -> ViewerRegistry {
        let mut registry = ViewerRegistry::with_builtins();
        for viewer in &self.config.client_viewers {
            registry.register_client(viewer.clone());
        }
        registry
    }

    /// Discover all markdown notes under the content root
    fn discover_note_files(&self, root: &Path) -> Vec<PathBuf> {
        let ignore_patterns = compile_ignore_patterns(&self.config.ignore_patterns);
        let reserved = &self.config.reserved_dirs;
        let mut files = Vec::new();

        let walker = WalkDir::new(root).sort_by_file_name().into_iter().filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && reserved.iter().any(|r| e.file_name() == r.as_str()))
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension() != Some(OsStr::new("md")) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            if should_ignore(&rel, &ignore_patterns) {
                tracing::debug!("Ignoring {} due to ignore_patterns", rel);
                continue;
            }

            files.push(entry.path().to_path_buf());
        }

        files
    }
}

fn check_content_root(root: &Path) -> Result<(), BuildError> {
    let fail = |source: io::Error| BuildError::ContentRoot {
        path: root.to_path_buf(),
        source,
    };
    let metadata = fs::metadata(root).map_err(fail)?;
    if !metadata.is_dir() {
        return Err(fail(io::Error::other("not a directory")));
    }
    fs::read_dir(root).map_err(fail)?;
    Ok(())
}

/// Read one note. `Ok(None)` when no slug can be derived from the path.
fn parse_note(
    root: &Path,
    path: &Path,
    resolver: &VirtualSlugResolver,
) -> io::Result<Option<Note>> {
    let Some(slug) = slug_from_path(root, path) else {
        return Ok(None);
    };
    let content = fs::read_to_string(path)?;
    let (metadata, body) = parse_frontmatter(&content);
    let links = extract_links(&body, resolver);

    let source_path = path
        .strip_prefix(root)
        .ok()
        .map(|p| p.to_string_lossy().replace('\\', "/"));

    Ok(Some(Note {
        slug,
        metadata,
        body,
        links,
        source_path,
    }))
}

fn compile_ignore_patterns(patterns: &[String]) -> Vec<Regex> {
    let mut compiled = Vec::new();
    for pat in patterns {
        match Regex::new(pat) {
            Ok(re) => compiled.push(re),
            Err(err) => tracing::warn!("Invalid ignore pattern '{}': {}", pat, err),
        }
    }
    compiled
}

fn should_ignore(path: &str, ignores: &[Regex]) -> bool {
    ignores.iter().any(|re| re.is_match(path))
}
