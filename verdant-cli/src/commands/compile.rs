//! Compile the garden into a JSON site index.

use super::GardenSource;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Build once and write every page, stub, and log record as JSON.
pub fn compile_garden(source: &GardenSource, output: Option<&Path>, pretty: bool) -> Result<()> {
    let index = source.build()?;
    let payload = index
        .to_json(pretty)
        .context("Failed to serialize site index")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
            fs::write(path, payload).with_context(|| format!("Failed to write {:?}", path))?;
            tracing::info!(
                "Wrote {} pages, {} stubs, {} log pages to {:?}",
                index.pages.len(),
                index.stubs.len(),
                index.logs.len(),
                path
            );
        }
        None => println!("{}", payload),
    }

    Ok(())
}
