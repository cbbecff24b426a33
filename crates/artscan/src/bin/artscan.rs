//! artscan CLI: inspect and maintain anchor stores and configs offline.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use artscan::core::{ArtworkCatalog, EligibleIds, JsonAnchorStore};
use artscan::{reconcile_anchors, AnchorReport, AppConfig, WorldAnchorStore};
use clap::{Parser, Subcommand};
use serde::Serialize;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "artscan")]
#[command(about = "Inspect artwork anchor stores and session configs")]
#[command(version)]
struct Cli {
    /// Session config (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config as JSON.
    ConfigInit {
        /// Output path.
        out: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Anchor store maintenance.
    Anchors {
        #[command(subcommand)]
        command: AnchorCommands,
    },
}

#[derive(Subcommand)]
enum AnchorCommands {
    /// Print every stored anchor and its position.
    List {
        /// Anchor store (JSON).
        #[arg(long)]
        store: PathBuf,
    },
    /// Classify the stored anchors the way session start-up does.
    Reconcile {
        #[arg(long)]
        store: PathBuf,

        /// Clear the store if it would be discarded at start-up.
        #[arg(long)]
        apply: bool,
    },
    /// List eligible catalog artworks without a scan-area anchor.
    Missing {
        #[arg(long)]
        store: PathBuf,

        /// Artwork catalog (JSON).
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[derive(Serialize)]
struct ReconcileOutput {
    #[serde(flatten)]
    report: AnchorReport,
    needs_reset: bool,
    cleared: bool,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_json(path)?,
        None => AppConfig::default(),
    };
    artscan::init_logging(&config)?;

    match cli.command {
        Commands::ConfigInit { out, force } => run_config_init(&config, &out, force),
        Commands::Anchors { command } => match command {
            AnchorCommands::List { store } => run_list(&store),
            AnchorCommands::Reconcile { store, apply } => run_reconcile(&config, &store, apply),
            AnchorCommands::Missing { store, catalog } => run_missing(&config, &store, &catalog),
        },
    }
}

fn run_config_init(config: &AppConfig, out: &Path, force: bool) -> CliResult<()> {
    if out.exists() && !force {
        return Err(format!("{} already exists (use --force)", out.display()).into());
    }
    config.write_json(out)?;
    log::info!("config written to {}", out.display());
    Ok(())
}

fn run_list(store: &Path) -> CliResult<()> {
    let store = JsonAnchorStore::open(store)?;
    for name in store.ids() {
        if let Some(pose) = store.get(&name) {
            let p = pose.position;
            println!("{name}\t{:.3}\t{:.3}\t{:.3}", p.x, p.y, p.z);
        }
    }
    Ok(())
}

fn stored_report(config: &AppConfig, store: &JsonAnchorStore) -> AnchorReport {
    let ids = EligibleIds::new(config.coordinator.artwork_limit);
    reconcile_anchors(&store.ids(), &config.coordinator.room_anchor_name, ids)
}

fn run_reconcile(config: &AppConfig, store: &Path, apply: bool) -> CliResult<()> {
    let mut store = JsonAnchorStore::open(store)?;
    let report = stored_report(config, &store);
    let needs_reset = report.needs_reset();

    let cleared = apply && needs_reset;
    if cleared {
        store.clear()?;
        log::warn!("anchor store {} cleared", store.path().display());
    }

    let output = ReconcileOutput {
        report,
        needs_reset,
        cleared,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_missing(config: &AppConfig, store: &Path, catalog: &Path) -> CliResult<()> {
    let store = JsonAnchorStore::open(store)?;
    let catalog = ArtworkCatalog::load_json(catalog)?;
    let report = stored_report(config, &store);
    let anchored: BTreeSet<_> = report.scan_areas.into_iter().collect();

    let ids = EligibleIds::new(config.coordinator.artwork_limit);
    for record in catalog.eligible(&ids) {
        if !anchored.contains(&record.id) {
            match &record.title {
                Some(title) => println!("{}\t{title}", record.id),
                None => println!("{}", record.id),
            }
        }
    }
    Ok(())
}
