use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_garden(root: &Path) -> std::io::Result<()> {
    let content = root.join("content");
    fs::create_dir_all(content.join("garden"))?;
    fs::write(
        root.join("verdant.yml"),
        r#"
paths:
  content: "content"
base_url: "/"
log_prefix: "log"
today: "2024-03-05"
"#,
    )?;
    fs::write(
        content.join("garden/rust.md"),
        "---\ntitle: Rust\ncreated: 2024-03-05\n---\nSee [[ghost]] and [[today]].\n",
    )?;
    fs::write(content.join("index.md"), "Start at [[garden/rust]].\n")?;
    Ok(())
}

#[allow(deprecated)]
fn verdant() -> Result<Command, Box<dyn std::error::Error>> {
    Ok(Command::cargo_bin("verdant")?)
}

#[test]
fn verify_json_reports_missing_slugs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_garden(dir.path())?;

    let assert = verdant()?
        .current_dir(dir.path())
        .args(["verify", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["notes"], 2);
    assert_eq!(value["missing"], serde_json::json!(["ghost"]));
    assert_eq!(value["warnings"], 1);
    assert_eq!(value["diagnostics"][0]["code"], "link.broken");
    Ok(())
}

#[test]
fn verify_text_summary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_garden(dir.path())?;

    verdant()?
        .current_dir(dir.path())
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("Verification complete: 2 notes"))
        .stdout(predicate::str::contains("Missing: ghost"));
    Ok(())
}

#[test]
fn slugs_lists_notes_for_bare_content_dir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_garden(dir.path())?;

    verdant()?
        .args(["--content"])
        .arg(dir.path().join("content"))
        .arg("slugs")
        .assert()
        .success()
        .stdout("garden/rust\nindex\n");
    Ok(())
}

#[test]
fn compile_writes_index_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_garden(dir.path())?;
    let out = dir.path().join("out/site.json");

    verdant()?
        .current_dir(dir.path())
        .args(["compile", "--pretty", "--output"])
        .arg(&out)
        .assert()
        .success();

    let value: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
    let logs: Vec<&str> = value["logs"]
        .as_array()
        .ok_or("logs array")?
        .iter()
        .filter_map(|l| l["slug"].as_str())
        .collect();
    assert!(logs.contains(&"log/2024-03-05"));
    assert!(logs.contains(&"log/2024-w10"));
    assert_eq!(value["stubs"][0]["slug"], "ghost");
    Ok(())
}

#[test]
fn note_shows_page_html() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_garden(dir.path())?;

    verdant()?
        .current_dir(dir.path())
        .args(["note", "/garden/rust.html", "--format", "html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("href=\"/log/2024-03-05.html\""))
        .stdout(predicate::str::contains("wikilink broken"));
    Ok(())
}

#[test]
fn note_unknown_slug_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write_garden(dir.path())?;

    verdant()?
        .current_dir(dir.path())
        .args(["note", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere"));
    Ok(())
}

#[test]
fn missing_config_fails_with_context() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    verdant()?
        .current_dir(dir.path())
        .arg("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}
