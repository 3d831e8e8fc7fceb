//! Command-line parsing for the uplift tree tool.
//!
//! Argument parsing and command dispatch stay separate from the fitting code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "uplift", version, about = "Uplift decision trees for randomized experiments")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit an uplift tree on a CSV dataset, print the tree, and optionally save it.
    Fit(FitArgs),
    /// Predict per-row uplift with a saved model.
    Predict(PredictArgs),
    /// Print a saved model's summary and tree.
    Show(ShowArgs),
    /// Write a synthetic experiment dataset with a known heterogeneous effect.
    Simulate(SimulateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Training CSV (header row required).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Column holding the 0/1 treatment flag.
    #[arg(long, default_value = "treatment")]
    pub treatment_col: String,

    /// Column holding the outcome.
    #[arg(long, default_value = "y")]
    pub outcome_col: String,

    /// Comma-separated feature columns (default: every other column).
    #[arg(long, value_delimiter = ',')]
    pub features: Option<Vec<String>>,

    /// Maximum tree depth (0 = root only, at most 64).
    #[arg(long, default_value_t = 3)]
    pub max_depth: usize,

    /// Minimum rows in each child of a split.
    #[arg(long, default_value_t = 1000)]
    pub min_samples_leaf: usize,

    /// Minimum treated rows in each child of a split.
    #[arg(long, default_value_t = 300)]
    pub min_samples_leaf_treated: usize,

    /// Minimum control rows in each child of a split.
    #[arg(long, default_value_t = 300)]
    pub min_samples_leaf_control: usize,

    /// Show top-N strongest and weakest segments.
    #[arg(long, default_value_t = 5)]
    pub top: usize,

    /// Save the fitted model to JSON.
    #[arg(long, value_name = "JSON")]
    pub output: Option<PathBuf>,

    /// Export one row per leaf to CSV.
    #[arg(long = "export-leaves", value_name = "CSV")]
    pub export_leaves: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Model JSON produced by `uplift fit --output`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// CSV with (at least) the model's feature columns.
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Write `row,uplift` CSV here instead of stdout.
    #[arg(long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// Model JSON produced by `uplift fit --output`.
    #[arg(long, value_name = "JSON")]
    pub model: PathBuf,

    /// Show top-N strongest and weakest segments.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

#[derive(Debug, Parser, Clone)]
pub struct SimulateArgs {
    /// Destination CSV (features, `treatment`, `y`).
    #[arg(long, value_name = "CSV")]
    pub output: PathBuf,

    /// Also write the per-row true effect (`row,true_effect`) to this CSV.
    #[arg(long = "truth-output", value_name = "CSV")]
    pub truth_output: Option<PathBuf>,

    #[arg(long, default_value_t = 10_000)]
    pub rows: usize,

    /// Number of uniform features (the effect depends on the first).
    #[arg(long, default_value_t = 3)]
    pub features: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Effect for rows with x0 <= 0.5.
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    pub base_effect: f64,

    /// Extra effect for rows with x0 > 0.5.
    #[arg(long, default_value_t = 4.0, allow_hyphen_values = true)]
    pub effect_shift: f64,

    /// Probability that a row is treated.
    #[arg(long, default_value_t = 0.5)]
    pub treated_share: f64,

    /// Outcome noise standard deviation.
    #[arg(long, default_value_t = 1.0)]
    pub noise: f64,
}
