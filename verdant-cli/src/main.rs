//! # verdant CLI
//!
//! Command-line interface for the verdant garden compiler.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, env = "VERDANT_CONFIG", default_value = "verdant.yml")]
    config: PathBuf,

    /// Build a bare content directory with default settings instead of
    /// reading a configuration file
    #[arg(long)]
    content: Option<PathBuf>,

    /// Fixed build date (YYYY-MM-DD) for relative-date links
    #[arg(long)]
    today: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the garden and emit the full site index as JSON
    Compile {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Build the garden and report diagnostics
    Verify {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List note slugs
    Slugs {
        /// List linked-to slugs with no note instead
        #[arg(long)]
        missing: bool,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one compiled page, stub, or log page
    Note {
        /// Page slug (e.g. "garden/rust" or "log/2024-w10")
        slug: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = NoteFormat::Json)]
        format: NoteFormat,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum NoteFormat {
    Json,
    Html,
    Frontmatter,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON on stdout stays parseable
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let source = commands::GardenSource {
        config: cli.config,
        content: cli.content,
        today: cli.today,
    };

    match cli.command {
        Commands::Compile { output, pretty } => {
            commands::compile_garden(&source, output.as_deref(), pretty)
        }
        Commands::Verify { json } => commands::verify_garden(&source, json),
        Commands::Slugs { missing, json } => commands::list_slugs(&source, missing, json),
        Commands::Note { slug, format } => commands::show_note(&source, &slug, format),
    }
}
