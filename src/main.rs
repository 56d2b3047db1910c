use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tailblaze::build::{build_feeds, build_site, build_sitemap, load_snapshot};
use tailblaze::config::Config;

/// Builds the feeds and sitemap of a static blog from its Markdown content.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to start searching for `tailblaze.yaml` from. Defaults to
    /// the working directory.
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Log every file loaded.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Default, Clone, Copy)]
enum Command {
    /// Write `sitemap.xml`.
    #[default]
    Sitemap,

    /// Write `feed.xml` and the per-tag feeds.
    Feeds,

    /// Write the feeds and the sitemap.
    Build,
}

fn init_logging(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("tailblaze=debug")
    } else {
        EnvFilter::new("tailblaze=info")
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let dir = match cli.project {
        Some(dir) => dir,
        None => std::env::current_dir().context("getting the working directory")?,
    };
    let config = Config::from_directory(&dir)?;

    match cli.command.unwrap_or_default() {
        Command::Sitemap => {
            let snapshot = load_snapshot(&config)?;
            build_sitemap(&config, &snapshot, Utc::now())?;
        }
        Command::Feeds => {
            let snapshot = load_snapshot(&config)?;
            build_feeds(&config, &snapshot)?;
        }
        Command::Build => build_site(&config)?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
