//! behavfit CLI
//!
//! One invocation handles one (analysis category × experiment version)
//! unit: it reads materialized inputs (trial data or posterior draw tables
//! exported by the sampling backend), runs the requested operation, and
//! writes a versioned CSV table into the output directory.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bf_inference::report;

mod ingest;

#[derive(Parser)]
#[command(name = "behavfit")]
#[command(about = "behavfit - Bayesian estimation and comparison for behavioral experiments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize posterior draws: estimates and 50/80/95% credible intervals
    Summarize {
        /// Posterior draws table (one column per parameter, one row per draw)
        #[arg(short, long)]
        draws: PathBuf,

        /// Model label for the output table
        #[arg(short, long)]
        model: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Experiment version identifier (e.g. "1A", "3B", "4")
        #[arg(short, long)]
        version: String,
    },

    /// Evaluate a linear hypothesis at significance levels 0.05, 0.20, 0.50
    Hypothesis {
        /// Posterior draws table
        #[arg(short, long)]
        draws: PathBuf,

        /// Hypothesis expression, e.g. "b_value = 0" or "2*b_a - b_b = 0.5"
        #[arg(short, long)]
        expr: String,

        /// Model label for the output table
        #[arg(short, long)]
        model: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Experiment version identifier
        #[arg(short, long)]
        version: String,
    },

    /// Contrast one parameter between two conditions (after minus before)
    Contrast {
        /// Draws table for the "after" condition
        #[arg(long)]
        after: PathBuf,

        /// Draws table for the "before" condition
        #[arg(long)]
        before: PathBuf,

        /// Parameter to contrast (must exist in both tables)
        #[arg(short, long)]
        parameter: String,

        /// Comparison label for the output table
        #[arg(short, long)]
        label: String,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Experiment version identifier
        #[arg(short, long)]
        version: String,
    },

    /// Generate synthetic trial tables from the episodic and feature-value agents
    Simulate {
        /// Number of simulated subjects
        #[arg(long, default_value_t = 30)]
        subjects: usize,

        /// Trials per subject
        #[arg(long, default_value_t = 25)]
        trials: usize,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,

        /// Experiment version identifier
        #[arg(short, long)]
        version: String,
    },

    /// Rescale numeric columns by their shared maximum absolute value
    Normalize {
        /// Input dataset (CSV with a `wid` column)
        #[arg(short, long)]
        input: PathBuf,

        /// Comma-separated numeric columns to rescale jointly
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,

        /// Output path for the rescaled dataset
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn ensure_out_dir(dir: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Summarize { draws, model, out_dir, version } => {
            ensure_out_dir(&out_dir)?;
            let draw_set = ingest::read_draws(&draws)
                .with_context(|| format!("reading draws from {}", draws.display()))?;
            let rows = report::summary_rows(&model, &bf_inference::summarize(&draw_set)?);
            let path = report::versioned_path(&out_dir, "summary", &version);
            report::write_table(&path, &rows)?;
            println!("{}", path.display());
        }

        Commands::Hypothesis { draws, expr, model, out_dir, version } => {
            ensure_out_dir(&out_dir)?;
            let draw_set = ingest::read_draws(&draws)
                .with_context(|| format!("reading draws from {}", draws.display()))?;
            let hypothesis = bf_inference::LinearHypothesis::parse(&expr)?;
            let result = bf_inference::evaluate(&hypothesis, &draw_set)?;
            let rows = report::hypothesis_rows(&model, &result);
            let path = report::versioned_path(&out_dir, "hypothesis", &version);
            report::write_table(&path, &rows)?;
            println!("{}", path.display());
        }

        Commands::Contrast { after, before, parameter, label, out_dir, version } => {
            ensure_out_dir(&out_dir)?;
            let after_draws = ingest::read_draws(&after)
                .with_context(|| format!("reading draws from {}", after.display()))?;
            let before_draws = ingest::read_draws(&before)
                .with_context(|| format!("reading draws from {}", before.display()))?;
            let contrast = bf_inference::contrast_parameter(
                &label,
                &parameter,
                &after_draws,
                &before_draws,
            )?;
            let path = report::versioned_path(&out_dir, "contrast", &version);
            report::write_contrast_table(&path, &[contrast])?;
            println!("{}", path.display());
        }

        Commands::Simulate { subjects, trials, seed, out_dir, version } => {
            ensure_out_dir(&out_dir)?;
            let config = bf_inference::SimulationConfig {
                subjects,
                trials_per_subject: trials,
                seed,
                ..bf_inference::SimulationConfig::default()
            };
            let (episodic, feature) = bf_inference::simulate_tables(&config)?;
            let episodic_path = report::versioned_path(&out_dir, "episodic_sim", &version);
            let feature_path = report::versioned_path(&out_dir, "feature_sim", &version);
            ingest::write_dataset(&episodic_path, &episodic)?;
            ingest::write_dataset(&feature_path, &feature)?;
            println!("{}", episodic_path.display());
            println!("{}", feature_path.display());
        }

        Commands::Normalize { input, columns, output } => {
            let mut data = ingest::read_dataset(&input)
                .with_context(|| format!("reading dataset from {}", input.display()))?;
            let cols: Vec<&str> = columns.iter().map(String::as_str).collect();
            let factor = bf_inference::shared_max_abs(&mut data, &cols)?;
            ingest::write_dataset(&output, &data)?;
            log::info!("normalized [{}] by {}", columns.join(", "), factor);
            println!("{}", output.display());
        }
    }

    Ok(())
}
