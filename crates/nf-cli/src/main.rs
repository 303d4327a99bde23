//! nufit CLI

mod card;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nf_fit::ComparisonRoutines;
use std::path::{Path, PathBuf};

use crate::card::Card;

#[derive(Parser)]
#[command(name = "nufit")]
#[command(about = "nufit - neutrino cross-section comparisons with cached reweighting")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare MC predictions with data for every sample in a card
    Compare {
        /// Comparison card (YAML)
        #[arg(short, long)]
        card: PathBuf,

        /// Output file for the report (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the card's fake-data setting (`MC` or a JSON file)
        #[arg(long)]
        fake_data: Option<String>,

        /// Reconfigure samples in parallel.
        #[arg(long)]
        parallel: bool,

        /// Also evaluate every sample at the nominal parameter values.
        #[arg(long)]
        save_nominal: bool,

        /// Threads (0 = auto).
        #[arg(long, default_value = "0")]
        threads: usize,
    },

    /// List the registered channels
    Channels {
        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Compare { card, output, fake_data, parallel, save_nominal, threads } => {
            cmd_compare(&card, output.as_ref(), fake_data, parallel, save_nominal, threads)
        }
        Commands::Channels { output } => cmd_channels(output.as_ref()),
    }
}

fn cmd_compare(
    card_path: &Path,
    output: Option<&PathBuf>,
    fake_data: Option<String>,
    parallel: bool,
    save_nominal: bool,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        // Best-effort; if a global pool already exists, keep going.
        let _ = rayon::ThreadPoolBuilder::new().num_threads(threads).build_global();
    }

    tracing::info!(path = %card_path.display(), "loading card");
    let mut card = Card::from_path(card_path)?;
    if fake_data.is_some() {
        card.fake_data = fake_data;
    }
    card.save_nominal |= save_nominal;
    let config = card.into_routine_config(parallel)?;
    let base_dir = card_path.parent().unwrap_or(Path::new("."));

    let mut routines = ComparisonRoutines::setup(config, base_dir)
        .with_context(|| format!("setting up comparison from {}", card_path.display()))?;
    tracing::info!(
        parameters = routines.parameters().len(),
        samples = routines.joint().len(),
        "card loaded"
    );

    let report = routines.run()?;
    tracing::info!(
        likelihood = report.joint.likelihood,
        ndof = report.joint.ndof,
        "comparison complete"
    );

    write_json(output, serde_json::to_value(&report)?)
}

fn cmd_channels(output: Option<&PathBuf>) -> Result<()> {
    let infos = nf_sample::channel_names()
        .into_iter()
        .map(nf_sample::channel_info)
        .collect::<nf_core::Result<Vec<_>>>()?;
    let channels: Vec<serde_json::Value> = infos
        .iter()
        .map(|info| {
            serde_json::json!({
                "name": info.name,
                "dimension": info.dimension,
                "enu_range_mev": [info.enu_range.0, info.enu_range.1],
                "default_type": info.default_type,
                "allowed_types": info.allowed_types,
                "norm_error": info.norm_error,
                "title": info.title,
            })
        })
        .collect();
    write_json(output, serde_json::Value::Array(channels))
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
