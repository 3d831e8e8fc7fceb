//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads datasets and models
//! - fits trees and prints reports
//! - writes optional exports

use std::io::Write;

use clap::Parser;

use crate::cli::{Command, FitArgs, PredictArgs, ShowArgs, SimulateArgs};
use crate::data::{SampleConfig, generate_sample};
use crate::domain::UpliftConfig;
use crate::error::AppError;
use crate::io::IngestOptions;
use crate::report::{DatasetInfo, format_fit_summary, format_segments, format_tree, leaf_rows, rank_segments, summarize};

pub mod pipeline;

/// Entry point for the `uplift` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Predict(args) => handle_predict(args),
        Command::Show(args) => handle_show(args),
        Command::Simulate(args) => handle_simulate(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let opts = ingest_options_from_args(&args);
    let run = pipeline::run_fit(&args.data, &opts, config, args.top)?;

    let info = DatasetInfo {
        source: args.data.display().to_string(),
        rows: run.ingest.rows_read,
        treated: run.ingest.treated_count(),
        control: run.ingest.control_count(),
        feature_names: run.ingest.feature_names.clone(),
    };
    println!("{}", format_fit_summary(&info, &config, &run.summary));
    if let Some(root) = run.model.tree() {
        println!("{}", format_tree(root, &run.ingest.feature_names));
    }
    println!("{}", format_segments(&run.rankings));

    if let Some(path) = &args.output {
        crate::io::write_model_json(path, &run.model_file()?)?;
        log::info!("saved model to {}", path.display());
    }
    if let Some(path) = &args.export_leaves {
        crate::io::write_leaves_csv(path, &run.leaves)?;
    }

    Ok(())
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let predictions = pipeline::run_predict(&args.model, &args.data)?;

    match &args.output {
        Some(path) => crate::io::write_predictions_csv(path, &predictions),
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            crate::io::write_predictions(&mut lock, &predictions)?;
            lock.flush()
                .map_err(|e| AppError::new(2, format!("Failed to write predictions: {e}")))
        }
    }
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let loaded = pipeline::load_model(&args.model)?;
    let root = loaded.model.tree().ok_or_else(|| AppError::new(4, "Saved model has no tree."))?;
    let names = &loaded.file.feature_names;

    let root_stats = root.stats();
    let info = DatasetInfo {
        source: args.model.display().to_string(),
        rows: root_stats.sample_count,
        treated: root_stats.treated_count,
        control: root_stats.control_count,
        feature_names: names.clone(),
    };
    println!("Fitted at: {}", loaded.file.fitted_at.to_rfc3339());
    println!("{}", format_fit_summary(&info, loaded.model.config(), &summarize(root)));
    println!("{}", format_tree(root, names));
    println!("{}", format_segments(&rank_segments(&leaf_rows(root, names), args.top)));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        rows: args.rows,
        features: args.features,
        seed: args.seed,
        treated_share: args.treated_share,
        base_effect: args.base_effect,
        effect_shift: args.effect_shift,
        noise: args.noise,
    };
    let sample = generate_sample(&config)?;
    crate::io::write_sample_csv(&args.output, &sample)?;
    if let Some(path) = &args.truth_output {
        crate::io::write_truth_csv(path, &sample)?;
    }

    println!(
        "Wrote {} rows to {} (features: {})",
        sample.n_rows(),
        args.output.display(),
        sample.feature_names.join(",")
    );
    Ok(())
}

/// Convert fit arguments into a validated growth configuration.
pub fn fit_config_from_args(args: &FitArgs) -> Result<UpliftConfig, AppError> {
    let config = UpliftConfig {
        max_depth: args.max_depth,
        min_samples_leaf: args.min_samples_leaf,
        min_samples_leaf_treated: args.min_samples_leaf_treated,
        min_samples_leaf_control: args.min_samples_leaf_control,
    };
    config.validate()?;
    Ok(config)
}

pub fn ingest_options_from_args(args: &FitArgs) -> IngestOptions {
    IngestOptions {
        treatment_col: args.treatment_col.clone(),
        outcome_col: args.outcome_col.clone(),
        features: args.features.clone(),
    }
}
