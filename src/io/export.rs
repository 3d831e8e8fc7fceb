//! CSV exports: predictions, per-leaf segments and synthetic samples.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data::SampleData;
use crate::error::AppError;
use crate::report::LeafRow;

/// Write per-row predictions as `row,uplift`.
pub fn write_predictions<W: Write>(out: W, predictions: &[f64]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["row", "uplift"])
        .map_err(|e| AppError::new(2, format!("Failed to write predictions header: {e}")))?;

    for (row, value) in predictions.iter().enumerate() {
        writer
            .write_record([row.to_string(), value.to_string()])
            .map_err(|e| AppError::new(2, format!("Failed to write prediction row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush predictions: {e}")))
}

pub fn write_predictions_csv(path: &Path, predictions: &[f64]) -> Result<(), AppError> {
    write_predictions(create(path, "predictions CSV")?, predictions)
}

/// Write one row per leaf: rule, counts and effect estimate.
pub fn write_leaves_csv(path: &Path, leaves: &[LeafRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(create(path, "leaves CSV")?);
    writer
        .write_record(["leaf", "depth", "rule", "samples", "treated", "control", "effect"])
        .map_err(|e| AppError::new(2, format!("Failed to write leaves header: {e}")))?;

    for leaf in leaves {
        writer
            .write_record([
                leaf.leaf.to_string(),
                leaf.depth.to_string(),
                leaf.rule.clone(),
                leaf.stats.sample_count.to_string(),
                leaf.stats.treated_count.to_string(),
                leaf.stats.control_count.to_string(),
                format!("{:.10}", leaf.stats.effect_estimate),
            ])
            .map_err(|e| AppError::new(2, format!("Failed to write leaf row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush leaves CSV: {e}")))
}

/// Write a synthetic sample in the training CSV layout (features, `treatment`, `y`).
///
/// Only trainable columns are written, so a default `fit` picks up exactly the
/// generated features. The true effect goes to `write_truth_csv`.
pub fn write_sample_csv(path: &Path, sample: &SampleData) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(create(path, "sample CSV")?);

    let mut header: Vec<String> = sample.feature_names.clone();
    header.extend(["treatment", "y"].map(String::from));
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write sample header: {e}")))?;

    for r in 0..sample.x.nrows() {
        let mut record: Vec<String> = (0..sample.x.ncols())
            .map(|c| format!("{:.10}", sample.x[(r, c)]))
            .collect();
        record.push(sample.treatment[r].to_string());
        record.push(format!("{:.10}", sample.y[r]));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write sample row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush sample CSV: {e}")))
}

/// Write the per-row true effect of a synthetic sample as `row,true_effect`.
pub fn write_truth_csv(path: &Path, sample: &SampleData) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(create(path, "truth CSV")?);
    writer
        .write_record(["row", "true_effect"])
        .map_err(|e| AppError::new(2, format!("Failed to write truth header: {e}")))?;

    for (row, effect) in sample.true_effect.iter().enumerate() {
        writer
            .write_record([row.to_string(), effect.to_string()])
            .map_err(|e| AppError::new(2, format!("Failed to write truth row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush truth CSV: {e}")))
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create {what} '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predictions_are_row_indexed() {
        let mut buf = Vec::new();
        write_predictions(&mut buf, &[1.5, -0.25]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["row,uplift", "0,1.5", "1,-0.25"]);
    }

    #[test]
    fn predictions_keep_full_precision() {
        let values = [0.1 + 0.2, 1.0 / 3.0, -2.0e-12, 123456.789];
        let mut buf = Vec::new();
        write_predictions(&mut buf, &values).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let parsed: Vec<f64> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap().parse().unwrap())
            .collect();
        assert_eq!(parsed, values);
    }
}
