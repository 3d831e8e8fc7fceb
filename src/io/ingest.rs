//! CSV ingest for training and prediction data.
//!
//! Turns a header-first CSV into a dense feature matrix plus (for training)
//! treatment flags and outcomes.
//!
//! Design goals:
//! - **Strict schema**: named columns must exist (clear errors + exit code 2)
//! - **Fail fast**: the first unparsable cell aborts the load with its line
//! - **Deterministic column order**: explicit feature list, else header order

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;

use crate::error::AppError;

/// Which columns hold treatment, outcome and features.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub treatment_col: String,
    pub outcome_col: String,
    /// Explicit feature columns (in this order). `None` means every other column.
    pub features: Option<Vec<String>>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            treatment_col: "treatment".to_string(),
            outcome_col: "y".to_string(),
            features: None,
        }
    }
}

/// Training data loaded from CSV.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub feature_names: Vec<String>,
    pub x: DMatrix<f64>,
    pub treatment: Vec<u8>,
    pub y: Vec<f64>,
    pub rows_read: usize,
}

impl IngestedData {
    pub fn treated_count(&self) -> usize {
        self.treatment.iter().filter(|&&t| t == 1).count()
    }

    pub fn control_count(&self) -> usize {
        self.treatment.iter().filter(|&&t| t == 0).count()
    }
}

/// Feature-only data loaded from CSV (for prediction).
#[derive(Debug, Clone)]
pub struct FeatureData {
    pub x: DMatrix<f64>,
    pub rows_read: usize,
}

/// Load a training CSV from disk.
pub fn load_training_csv(path: &Path, opts: &IngestOptions) -> Result<IngestedData, AppError> {
    read_training(open_csv(path)?, opts)
}

/// Load the feature columns named by `feature_names` from a CSV on disk.
pub fn load_feature_csv(path: &Path, feature_names: &[String]) -> Result<FeatureData, AppError> {
    read_features(open_csv(path)?, feature_names)
}

fn open_csv(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

/// Parse training data from any CSV reader.
pub fn read_training<R: Read>(source: R, opts: &IngestOptions) -> Result<IngestedData, AppError> {
    let mut reader = csv_reader(source);
    let headers = read_headers(&mut reader)?;
    let header_map = build_header_map(&headers)?;

    let treatment_name = normalize_header_name(&opts.treatment_col);
    let outcome_name = normalize_header_name(&opts.outcome_col);
    let treatment_idx = column_index(&header_map, &treatment_name)?;
    let outcome_idx = column_index(&header_map, &outcome_name)?;

    let feature_names: Vec<String> = match &opts.features {
        Some(list) => list.iter().map(|n| normalize_header_name(n)).collect(),
        None => headers
            .iter()
            .map(normalize_header_name)
            .filter(|n| *n != treatment_name && *n != outcome_name)
            .collect(),
    };
    reject_duplicate_features(&feature_names)?;
    if feature_names.contains(&treatment_name) || feature_names.contains(&outcome_name) {
        return Err(AppError::new(
            2,
            "Treatment and outcome columns cannot also be used as features.",
        ));
    }
    let feature_idx = feature_names
        .iter()
        .map(|n| column_index(&header_map, n))
        .collect::<Result<Vec<_>, _>>()?;

    if opts.features.is_some() {
        let ignored = headers.len().saturating_sub(feature_idx.len() + 2);
        if ignored > 0 {
            log::warn!("ignoring {ignored} CSV column(s) not listed as features");
        }
    }

    let mut values = Vec::new();
    let mut treatment = Vec::new();
    let mut y = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, and the header occupies line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error at line {line}: {e}")))?;

        for (&col, name) in feature_idx.iter().zip(&feature_names) {
            values.push(parse_f64(&record, col, name, line)?);
        }
        treatment.push(parse_treatment(&record, treatment_idx, &treatment_name, line)?);
        y.push(parse_f64(&record, outcome_idx, &outcome_name, line)?);
    }

    if rows_read == 0 {
        return Err(AppError::new(3, "CSV contains no data rows."));
    }

    let x = DMatrix::from_row_slice(rows_read, feature_names.len(), &values);
    log::info!(
        "loaded {rows_read} rows with {} feature(s) from CSV",
        feature_names.len()
    );

    Ok(IngestedData {
        feature_names,
        x,
        treatment,
        y,
        rows_read,
    })
}

/// Parse the named feature columns from any CSV reader.
///
/// Columns are matched case-insensitively; extra columns are ignored.
pub fn read_features<R: Read>(source: R, feature_names: &[String]) -> Result<FeatureData, AppError> {
    let mut reader = csv_reader(source);
    let headers = read_headers(&mut reader)?;
    let header_map = build_header_map(&headers)?;

    let names: Vec<String> = feature_names.iter().map(|n| normalize_header_name(n)).collect();
    reject_duplicate_features(&names)?;
    let feature_idx = names
        .iter()
        .map(|n| column_index(&header_map, n))
        .collect::<Result<Vec<_>, _>>()?;

    let mut values = Vec::new();
    let mut rows_read = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error at line {line}: {e}")))?;
        for (&col, name) in feature_idx.iter().zip(&names) {
            values.push(parse_f64(&record, col, name, line)?);
        }
    }

    Ok(FeatureData {
        x: DMatrix::from_row_slice(rows_read, names.len(), &values),
        rows_read,
    })
}

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<StringRecord, AppError> {
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    if headers.is_empty() {
        return Err(AppError::new(2, "CSV has no header row."));
    }
    Ok(headers)
}

/// Map normalized header names to column indices.
///
/// Names are compared case-insensitively, so `Age` and `age` collide and fail
/// the load instead of one silently shadowing the other.
fn build_header_map(headers: &StringRecord) -> Result<HashMap<String, usize>, AppError> {
    let mut map = HashMap::with_capacity(headers.len());
    for (idx, raw) in headers.iter().enumerate() {
        let name = normalize_header_name(raw);
        if let Some(first) = map.insert(name.clone(), idx) {
            return Err(AppError::new(
                2,
                format!("Duplicate column `{name}` (columns {} and {})", first + 1, idx + 1),
            ));
        }
    }
    Ok(map)
}

fn reject_duplicate_features(names: &[String]) -> Result<(), AppError> {
    for (i, name) in names.iter().enumerate() {
        if names[..i].contains(name) {
            return Err(AppError::new(2, format!("Duplicate feature `{name}` in feature list")));
        }
    }
    Ok(())
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn column_index(header_map: &HashMap<String, usize>, name: &str) -> Result<usize, AppError> {
    header_map
        .get(name)
        .copied()
        .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str, line: usize) -> Result<&'a str, AppError> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::new(2, format!("Line {line}: missing value for `{name}`")))
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<f64, AppError> {
    let raw = get_required(record, idx, name, line)?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AppError::new(
            2,
            format!("Line {line}: `{name}` must be a finite number, got '{raw}'"),
        )),
    }
}

fn parse_treatment(record: &StringRecord, idx: usize, name: &str, line: usize) -> Result<u8, AppError> {
    let raw = get_required(record, idx, name, line)?;
    match raw {
        "0" => Ok(0),
        "1" => Ok(1),
        _ => Err(AppError::new(
            2,
            format!("Line {line}: `{name}` must be 0 or 1, got '{raw}'"),
        )),
    }
}
