//! Shared pipeline logic behind the CLI commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> fit -> summary/leaf rows -> rankings, and
//! model load -> feature ingest -> predict.
//!
//! The command handlers then only deal with presentation and exports.

use std::path::Path;

use crate::domain::UpliftConfig;
use crate::error::AppError;
use crate::io::{IngestOptions, IngestedData, ModelFile, load_feature_csv, load_training_csv, read_model_json};
use crate::model::UpliftTreeRegressor;
use crate::report::{LeafRow, SegmentRankings, TreeSummary, leaf_rows, rank_segments, summarize};

/// Everything computed by one `uplift fit` run.
#[derive(Debug, Clone)]
pub struct FitOutput {
    pub ingest: IngestedData,
    pub model: UpliftTreeRegressor,
    pub summary: TreeSummary,
    pub leaves: Vec<LeafRow>,
    pub rankings: SegmentRankings,
}

impl FitOutput {
    /// Package the fitted model for saving.
    pub fn model_file(&self) -> Result<ModelFile, AppError> {
        Ok(ModelFile::from_model(&self.model, &self.ingest.feature_names)?)
    }
}

/// A saved model plus its reconstructed regressor.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub file: ModelFile,
    pub model: UpliftTreeRegressor,
}

pub fn run_fit(data: &Path, opts: &IngestOptions, config: UpliftConfig, top_n: usize) -> Result<FitOutput, AppError> {
    let ingest = load_training_csv(data, opts)?;
    fit_ingested(ingest, config, top_n)
}

/// Fit on already-loaded data.
pub fn fit_ingested(ingest: IngestedData, config: UpliftConfig, top_n: usize) -> Result<FitOutput, AppError> {
    let mut model = UpliftTreeRegressor::new(config)?;
    model.fit(&ingest.x, &ingest.treatment, &ingest.y)?;

    let root = model
        .tree()
        .ok_or_else(|| AppError::new(4, "Model reported no tree after a successful fit."))?;
    let summary = summarize(root);
    let leaves = leaf_rows(root, &ingest.feature_names);
    let rankings = rank_segments(&leaves, top_n);

    Ok(FitOutput {
        ingest,
        model,
        summary,
        leaves,
        rankings,
    })
}

pub fn load_model(path: &Path) -> Result<LoadedModel, AppError> {
    let file = read_model_json(path)?;
    let model = file.to_model()?;
    log::info!(
        "loaded model from {} ({} features, fitted {})",
        path.display(),
        file.n_features,
        file.fitted_at.to_rfc3339()
    );
    Ok(LoadedModel { file, model })
}

/// Predict uplift for every row of `data` with the model saved at `model_path`.
pub fn run_predict(model_path: &Path, data: &Path) -> Result<Vec<f64>, AppError> {
    let loaded = load_model(model_path)?;
    let features = load_feature_csv(data, &loaded.file.feature_names)?;
    Ok(loaded.model.predict(&features.x)?)
}
