//! Basename collision index used to disambiguate broken links.

use crate::slug::basename;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Basename → every slug sharing it, only for groups of two or more
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlugCollisions {
    groups: BTreeMap<String, Vec<String>>,
}

impl SlugCollisions {
    pub fn build<'a>(slugs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut by_base: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for slug in slugs {
            by_base
                .entry(basename(slug).to_string())
                .or_default()
                .push(slug.to_string());
        }

        let groups = by_base
            .into_iter()
            .filter_map(|(base, mut slugs)| {
                slugs.sort();
                slugs.dedup();
                (slugs.len() >= 2).then_some((base, slugs))
            })
            .collect();

        Self { groups }
    }

    /// Collision group for the basename of `slug`
    pub fn candidates(&self, slug: &str) -> Option<&[String]> {
        self.groups.get(basename(slug)).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(base, slugs)| (base.as_str(), slugs.as_slice()))
    }
}

/// Preferred slug among candidates: a root-level slug, otherwise the
/// lexicographically smallest.
pub fn canonical_pick(candidates: &[String]) -> Option<&str> {
    candidates
        .iter()
        .filter(|slug| !slug.contains('/'))
        .min()
        .or_else(|| candidates.iter().min())
        .map(String::as_str)
}
