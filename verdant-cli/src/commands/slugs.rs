//! List note slugs for editor autocomplete.

use super::GardenSource;
use anyhow::Result;

pub fn list_slugs(source: &GardenSource, missing: bool, json: bool) -> Result<()> {
    let index = source.build()?;
    let slugs: Vec<&str> = if missing {
        index.missing.iter().map(String::as_str).collect()
    } else {
        index.slugs.iter().map(String::as_str).collect()
    };

    if json {
        println!("{}", serde_json::to_string(&slugs)?);
    } else {
        for slug in slugs {
            println!("{}", slug);
        }
    }

    Ok(())
}
