//! Page assembly: turn notes, indices, and rendered bodies into the records
//! the templating layer consumes.

use crate::collisions::{canonical_pick, SlugCollisions};
use crate::graph::LinkGraph;
use crate::models::{
    BacklinkItem, Diagnostic, Disambiguation, LogPageRecord, Note, NoteRef, PageRecord, SiteIndex,
    StubRecord,
};
use crate::slug::basename;
use crate::temporal::{log_slug, LogIndex, PeriodInfo};
use crate::virtual_slugs::VirtualSlugResolver;
use std::collections::{BTreeSet, HashMap};

pub struct PageAssembler<'a> {
    pub notes: &'a [Note],
    pub graph: &'a LinkGraph,
    pub collisions: &'a SlugCollisions,
    pub logs: &'a LogIndex,
    pub resolver: &'a VirtualSlugResolver,
    pub base_url: &'a str,
}

impl<'a> PageAssembler<'a> {
    /// Build the site index. `rendered` maps note slugs to body HTML.
    pub fn assemble(
        &self,
        mut rendered: HashMap<String, String>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> SiteIndex {
        let titles: HashMap<&str, String> = self
            .notes
            .iter()
            .map(|n| (n.slug.as_str(), n.title()))
            .collect();

        let mut pages = Vec::new();
        let mut log_notes: HashMap<String, &Note> = HashMap::new();

        for note in self.notes {
            if let Some(key) = self.log_key(&note.slug) {
                log_notes.insert(key.to_string(), note);
                continue;
            }
            pages.push(PageRecord {
                slug: note.slug.clone(),
                title: note.title(),
                status: note.status(),
                metadata: note.metadata.clone(),
                html: rendered.remove(&note.slug).unwrap_or_default(),
                backlinks: self.backlink_items(&note.slug, &titles),
                source_path: note.source_path.clone(),
            });
        }

        let stubs = self
            .graph
            .missing
            .iter()
            .map(|slug| self.stub(slug, &titles, &mut diagnostics))
            .collect();

        // Active periods, linked log pages, and hand-written log notes
        let mut keys: BTreeSet<String> = self.logs.periods.clone();
        keys.extend(
            self.graph
                .backlinks
                .keys()
                .filter_map(|target| self.log_key(target))
                .map(str::to_string),
        );
        keys.extend(log_notes.keys().cloned());

        let logs = keys
            .iter()
            .filter_map(|key| {
                let note = log_notes.get(key.as_str());
                let html = note.and_then(|n| rendered.remove(&n.slug));
                self.log_page(key, html, &titles)
            })
            .collect();

        let mut slugs: Vec<String> = self.notes.iter().map(|n| n.slug.clone()).collect();
        slugs.sort();

        SiteIndex {
            pages,
            stubs,
            logs,
            missing: self.graph.missing.clone(),
            collisions: self.collisions.clone(),
            diagnostics,
            slugs,
        }
    }

    /// Period key of a slug inside the log namespace, if it parses as one
    fn log_key<'s>(&self, slug: &'s str) -> Option<&'s str> {
        if !self.resolver.is_log_slug(slug) {
            return None;
        }
        let key = &slug[self.resolver.log_prefix().len() + 1..];
        PeriodInfo::parse(key).map(|_| key)
    }

    fn backlink_items(&self, slug: &str, titles: &HashMap<&str, String>) -> Vec<BacklinkItem> {
        self.graph
            .backlinks_for(slug)
            .iter()
            .map(|entry| {
                let mut href = format!("{}{}.html", self.base_url, entry.source);
                if let Some(anchor) = &entry.anchor {
                    href.push('#');
                    href.push_str(anchor);
                }
                BacklinkItem {
                    slug: entry.source.clone(),
                    title: titles
                        .get(entry.source.as_str())
                        .cloned()
                        .unwrap_or_else(|| basename(&entry.source).to_string()),
                    link_text: entry.display.clone(),
                    href,
                }
            })
            .collect()
    }

    fn stub(
        &self,
        slug: &str,
        titles: &HashMap<&str, String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> StubRecord {
        let backlinks = self.backlink_items(slug, titles);
        for item in &backlinks {
            diagnostics.push(
                Diagnostic::warning(
                    "link.broken",
                    format!("'{}' links to missing note '{}'", item.slug, slug),
                    Some(&item.slug),
                )
                .with_context(slug),
            );
        }

        let disambiguation = self.collisions.candidates(slug).map(|group| {
            diagnostics.push(
                Diagnostic::info(
                    "link.ambiguous",
                    format!("'{}' could refer to: {}", slug, group.join(", ")),
                    None,
                )
                .with_context(slug),
            );
            Disambiguation {
                candidates: group
                    .iter()
                    .map(|candidate| NoteRef {
                        slug: candidate.clone(),
                        title: titles
                            .get(candidate.as_str())
                            .cloned()
                            .unwrap_or_else(|| basename(candidate).to_string()),
                    })
                    .collect(),
                canonical: canonical_pick(group).map(str::to_string),
            }
        });

        StubRecord {
            slug: slug.to_string(),
            title: basename(slug).to_string(),
            backlinks,
            disambiguation,
        }
    }

    fn log_page(
        &self,
        key: &str,
        html: Option<String>,
        titles: &HashMap<&str, String>,
    ) -> Option<LogPageRecord> {
        let info = PeriodInfo::parse(key)?;
        let prefix = self.resolver.log_prefix();
        let slug = log_slug(prefix, key);

        Some(LogPageRecord {
            title: info.title(),
            parents: info.parents(prefix),
            children: self.logs.children(&info, prefix),
            created: self.logs.created_in(key).to_vec(),
            updated: self.logs.updated_in(key).to_vec(),
            backlinks: self.backlink_items(&slug, titles),
            period: info.period,
            key: info.key,
            year: info.year,
            month: info.month,
            week: info.week,
            day: info.day,
            html,
            slug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkRecord, Metadata};
    use crate::temporal::LogPeriod;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn note(slug: &str, meta: &[(&str, &str)], links: &[&str]) -> Note {
        let mut metadata = Metadata::new();
        for (k, v) in meta {
            metadata.insert(*k, *v);
        }
        Note {
            slug: slug.to_string(),
            metadata,
            body: String::new(),
            links: links
                .iter()
                .map(|t| LinkRecord {
                    anchor: Some(crate::slug::anchor_id(t)),
                    ..LinkRecord::inline(*t)
                })
                .collect(),
            source_path: Some(format!("{}.md", slug)),
        }
    }

    fn assemble(notes: &[Note]) -> SiteIndex {
        let resolver =
            VirtualSlugResolver::new(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), "log");
        let known: HashSet<String> = notes.iter().map(|n| n.slug.clone()).collect();
        let graph = LinkGraph::build(notes, &known, &resolver);
        let collisions = SlugCollisions::build(known.iter().map(String::as_str));
        let logs = LogIndex::build(notes);
        let rendered = notes
            .iter()
            .map(|n| (n.slug.clone(), format!("<p>{}</p>", n.slug)))
            .collect();
        PageAssembler {
            notes,
            graph: &graph,
            collisions: &collisions,
            logs: &logs,
            resolver: &resolver,
            base_url: "/",
        }
        .assemble(rendered, Vec::new())
    }

    #[test]
    fn test_pages_carry_backlinks_with_deep_links() {
        let index = assemble(&[note("a", &[("title", "Alpha")], &["b"]), note("b", &[], &[])]);
        let b = index.find_page("b").unwrap();
        assert_eq!(b.html, "<p>b</p>");
        assert_eq!(b.backlinks.len(), 1);
        assert_eq!(b.backlinks[0].title, "Alpha");
        assert_eq!(b.backlinks[0].href, "/a.html#ref-b");
        assert!(index.stubs.is_empty());
        assert_eq!(index.slugs, vec!["a", "b"]);
    }

    #[test]
    fn test_stub_for_missing_note() {
        let index = assemble(&[note("a", &[], &["ghost"])]);
        let stub = index.find_stub("ghost").unwrap();
        assert_eq!(stub.title, "ghost");
        assert_eq!(stub.backlinks[0].slug, "a");
        assert!(stub.disambiguation.is_none());
        assert!(index
            .diagnostics
            .iter()
            .any(|d| d.code == "link.broken" && d.note_slug.as_deref() == Some("a")));
    }

    #[test]
    fn test_stub_disambiguates_collisions() {
        let index = assemble(&[
            note("x/note", &[("title", "X Note")], &[]),
            note("y/note", &[], &[]),
            note("c", &[], &["note"]),
        ]);
        let stub = index.find_stub("note").unwrap();
        let choice = stub.disambiguation.as_ref().unwrap();
        let slugs: Vec<&str> = choice.candidates.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["x/note", "y/note"]);
        assert_eq!(choice.candidates[0].title, "X Note");
        assert_eq!(choice.canonical.as_deref(), Some("x/note"));
        assert!(index.diagnostics.iter().any(|d| d.code == "link.ambiguous"));
    }

    #[test]
    fn test_log_pages_for_activity_links_and_notes() {
        let index = assemble(&[
            note("a", &[("created", "2024-03-05")], &["log/2023-12-25"]),
            note("log/2024-03-05", &[], &[]),
            note("log/readme", &[], &[]),
        ]);

        let day = index.find_log("log/2024-03-05").unwrap();
        assert_eq!(day.period, LogPeriod::Day);
        assert_eq!(day.created[0].slug, "a");
        assert_eq!(day.html.as_deref(), Some("<p>log/2024-03-05</p>"));
        assert_eq!(day.parents.len(), 3);
        assert!(index.find_page("log/2024-03-05").is_none());

        let week = index.find_log("log/2024-w10").unwrap();
        assert_eq!(week.title, "Week 10 of 2024");
        assert_eq!(week.children.len(), 1);

        let linked = index.find_log("log/2023-12-25").unwrap();
        assert!(linked.created.is_empty());
        assert_eq!(linked.backlinks[0].slug, "a");

        // not a period key, so an ordinary page
        assert!(index.find_page("log/readme").is_some());
        assert!(index.missing.is_empty());
    }
}
