//! Verify garden health and emit diagnostics.

use super::GardenSource;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use verdant_core::{Diagnostic, DiagnosticSeverity};

#[derive(Serialize)]
struct VerificationSummary<'a> {
    notes: usize,
    errors: usize,
    warnings: usize,
    infos: usize,
    missing: &'a BTreeSet<String>,
    diagnostics: &'a [Diagnostic],
}

/// Run the build pipeline and surface diagnostics without writing output.
pub fn verify_garden(source: &GardenSource, json: bool) -> Result<()> {
    let index = source.build()?;

    let count = |severity: DiagnosticSeverity| {
        index
            .diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    };

    let summary = VerificationSummary {
        notes: index.slugs.len(),
        errors: count(DiagnosticSeverity::Error),
        warnings: count(DiagnosticSeverity::Warning),
        infos: count(DiagnosticSeverity::Info),
        missing: &index.missing,
        diagnostics: &index.diagnostics,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!(
        "Verification complete: {} notes, {} errors, {} warnings, {} info",
        summary.notes, summary.errors, summary.warnings, summary.infos
    );
    if !summary.missing.is_empty() {
        let missing: Vec<&str> = summary.missing.iter().map(String::as_str).collect();
        println!("Missing: {}", missing.join(", "));
    }
    for diag in summary.diagnostics {
        let slug = diag
            .note_slug
            .as_deref()
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        println!("- {:?} {}{}: {}", diag.severity, diag.code, slug, diag.message);
        if let Some(ctx) = &diag.context {
            println!("  context: {}", ctx);
        }
    }

    Ok(())
}
