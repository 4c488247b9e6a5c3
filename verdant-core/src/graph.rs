//! Forward links, deduplicated backlinks, and missing targets.

use crate::models::{BacklinkEntry, Note};
use crate::virtual_slugs::VirtualSlugResolver;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkGraph {
    /// Note slug → distinct targets, first-seen order
    pub forward: BTreeMap<String, Vec<String>>,
    /// Target → one entry per distinct source note
    pub backlinks: BTreeMap<String, Vec<BacklinkEntry>>,
    /// Targets with no note behind them
    pub missing: BTreeSet<String>,
}

impl LinkGraph {
    /// Index the links of `notes`.
    ///
    /// Sources are visited in slug order so backlink lists are stable. A note
    /// linking to the same target several times contributes one entry, taking
    /// display text and anchor from the first occurrence.
    pub fn build(notes: &[Note], known: &HashSet<String>, resolver: &VirtualSlugResolver) -> Self {
        let mut graph = Self::default();
        let mut ordered: Vec<&Note> = notes.iter().collect();
        ordered.sort_by(|a, b| a.slug.cmp(&b.slug));

        for note in ordered {
            let mut seen = HashSet::new();
            let mut targets = Vec::new();

            for link in &note.links {
                if !seen.insert(link.target.as_str()) {
                    continue;
                }
                targets.push(link.target.clone());
                graph
                    .backlinks
                    .entry(link.target.clone())
                    .or_default()
                    .push(BacklinkEntry {
                        source: note.slug.clone(),
                        display: link.display.clone(),
                        anchor: link.anchor.clone(),
                    });

                if !known.contains(&link.target) && !resolver.is_satisfiable(&link.target) {
                    graph.missing.insert(link.target.clone());
                }
            }

            graph.forward.insert(note.slug.clone(), targets);
        }

        graph
    }

    pub fn outgoing(&self, slug: &str) -> &[String] {
        self.forward.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn backlinks_for(&self, slug: &str) -> &[BacklinkEntry] {
        self.backlinks.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_missing(&self, slug: &str) -> bool {
        self.missing.contains(slug)
    }
}
