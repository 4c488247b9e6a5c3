//! # verdant-core
//!
//! Content-graph compiler for verdant digital gardens.
//!
//! This crate turns a directory of interlinked markdown notes into page,
//! stub, and log records: wikilinks are resolved (including relative-date
//! keywords), backlinks indexed, notes bucketed by day, week, month, and
//! year, and code fences expanded through transclusion and viewers.

pub mod assemble;
pub mod builder;
pub mod collisions;
pub mod config;
pub mod fence;
pub mod frontmatter;
pub mod graph;
pub mod markdown;
pub mod models;
pub mod segment;
pub mod slug;
pub mod temporal;
pub mod transclude;
pub mod viewers;
pub mod virtual_slugs;
pub mod wikilinks;

pub use builder::{BuildContext, BuildError, GardenBuilder};
pub use collisions::SlugCollisions;
pub use config::{Config, ConfigError};
pub use fence::FenceMeta;
pub use graph::LinkGraph;
pub use models::{
    BacklinkEntry, BacklinkItem, Diagnostic, DiagnosticSeverity, LinkKind, LinkRecord,
    LogPageRecord, Metadata, Note, PageRecord, SiteIndex, Status, StubRecord,
};
pub use slug::slugify;
pub use temporal::{DateInfo, LogIndex, LogPeriod};
pub use transclude::{TranscludeError, TranscludeTarget};
pub use virtual_slugs::VirtualSlugResolver;
