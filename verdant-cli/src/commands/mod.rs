//! CLI command implementations.

pub mod compile;
pub mod note;
pub mod slugs;
pub mod verify;

pub use compile::compile_garden;
pub use note::show_note;
pub use slugs::list_slugs;
pub use verify::verify_garden;

use anyhow::{Context, Result};
use std::path::PathBuf;
use verdant_core::{temporal::parse_date, Config, GardenBuilder, SiteIndex};

/// Where the garden comes from, as given on the command line
pub struct GardenSource {
    pub config: PathBuf,
    pub content: Option<PathBuf>,
    pub today: Option<String>,
}

impl GardenSource {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.content {
            Some(dir) => Config::for_content_dir(dir),
            None => Config::from_file(&self.config).with_context(|| {
                format!("Failed to load configuration from {:?}", self.config)
            })?,
        };

        if let Some(today) = &self.today {
            let date = parse_date(today)
                .with_context(|| format!("Invalid --today '{}', expected YYYY-MM-DD", today))?;
            config.today = Some(date);
        }

        Ok(config)
    }

    /// Load configuration and run one build
    pub fn build(&self) -> Result<SiteIndex> {
        let config = self.load_config()?;
        GardenBuilder::new(config)
            .build()
            .context("Failed to build garden")
    }
}
