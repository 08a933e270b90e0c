//! Scapegoat Simulation Runner
//!
//! Runs one or more replicates of a mechanism variant and prints a summary
//! line per run.

use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mimesis_core::config::DEFAULT_CONFIG_PATH;
use mimesis_core::output::{write_json, MetricsStream};
use mimesis_core::{run_replicates, RunSummary, SimConfig, Variant};

/// Command line arguments for the runner
#[derive(Parser, Debug)]
#[command(name = "scapegoat_sim")]
#[command(about = "Mimetic desire and scapegoat expulsion on a social network")]
struct Args {
    /// TOML configuration file (defaults to scapegoat.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mechanism variant: LM, AC, RL or RA
    #[arg(long)]
    variant: Option<Variant>,

    /// Random seed for the first replicate
    #[arg(long)]
    seed: Option<u64>,

    /// Number of timesteps per run
    #[arg(long)]
    steps: Option<u64>,

    /// Salience exponent for convex spread
    #[arg(long)]
    gamma: Option<f64>,

    /// Number of independent replicates
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Never expel anyone
    #[arg(long)]
    no_expulsion: bool,

    /// Write run summaries as JSON
    #[arg(long)]
    output: Option<PathBuf>,

    /// Stream the first run's per-step metrics as JSONL
    #[arg(long)]
    metrics: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    variant: String,
    stopped_early: bool,
    summary: RunSummary,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        variant = %config.variant().map_or("custom", |v| v.code()),
        n_agents = config.n_agents,
        n_steps = config.n_steps,
        runs = args.runs,
        "configuration loaded"
    );

    let provider = config.topology.clone();
    let results = run_replicates(&config, &provider, args.runs)?;

    println!("Scapegoat Simulation");
    println!("====================");
    let mut reports = Vec::with_capacity(results.len());
    for result in &results {
        let summary = result.summary();
        println!(
            "seed {:>6}  steps {:>5}  expelled {:>3}  remaining {:>3}  gini {:.3}/{:.3}  top share {:.3}  modal {:.3}  converged {:.3}  catharsis {:.3}  t95 {}",
            result.config.seed,
            summary.steps_run,
            summary.n_expulsions,
            summary.agents_remaining,
            summary.mean_gini,
            summary.peak_gini,
            summary.peak_top_share,
            summary.final_modal_agreement,
            summary.fraction_converged,
            summary.mean_catharsis,
            summary
                .time_to_95
                .map_or_else(|| "-".to_string(), |t| t.to_string()),
        );
        reports.push(RunReport {
            seed: result.config.seed,
            variant: result
                .config
                .variant()
                .map_or_else(|| "custom".to_string(), |v| v.to_string()),
            stopped_early: result.stopped_early,
            summary,
        });
    }

    if let Some(path) = &args.output {
        write_json(&reports, path)?;
        info!(path = %path.display(), "summaries written");
    }

    if let (Some(path), Some(first)) = (&args.metrics, results.first()) {
        if first.metrics.is_empty() {
            warn!("history recording is off, metrics stream will be empty");
        }
        let mut stream = MetricsStream::create(path)?;
        stream.write_all(&first.metrics)?;
        stream.flush()?;
        info!(path = %path.display(), lines = stream.lines(), "metrics written");
    }

    Ok(())
}

/// File configuration first, then command line overrides
fn load_config(args: &Args) -> Result<SimConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => SimConfig::load(DEFAULT_CONFIG_PATH)?,
        None => SimConfig::default(),
    };

    if let Some(variant) = args.variant {
        config = config.with_variant(variant);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(steps) = args.steps {
        config.n_steps = steps;
    }
    if let Some(gamma) = args.gamma {
        config.salience_exponent = gamma;
        if !config.spread.is_convex_family() {
            warn!(gamma, "salience exponent has no effect under linear spread");
        }
    }
    if args.no_expulsion {
        config.expulsion_threshold = None;
    }

    config.validate()?;
    Ok(config)
}
