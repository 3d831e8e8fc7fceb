//! Synthetic randomized-experiment generation.
//!
//! Features are uniform on `[0, 1)`. Treatment is assigned at random with
//! probability `treated_share`. The true effect depends on the first feature:
//!
//! `effect(x) = base_effect + effect_shift * 1[x0 > 0.5]`
//!
//! and the outcome is `y = sum(x) + t * effect(x) + noise * z`, `z ~ N(0, 1)`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use nalgebra::DMatrix;

use crate::error::AppError;

/// Cut on the first feature where the true effect steps up.
pub const EFFECT_CUT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConfig {
    pub rows: usize,
    pub features: usize,
    pub seed: u64,
    pub treated_share: f64,
    pub base_effect: f64,
    pub effect_shift: f64,
    pub noise: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            rows: 10_000,
            features: 3,
            seed: 42,
            treated_share: 0.5,
            base_effect: 1.0,
            effect_shift: 4.0,
            noise: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub feature_names: Vec<String>,
    pub x: DMatrix<f64>,
    pub treatment: Vec<u8>,
    pub y: Vec<f64>,
    /// Effect each row would see if treated.
    pub true_effect: Vec<f64>,
}

impl SampleData {
    pub fn n_rows(&self) -> usize {
        self.y.len()
    }
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.rows == 0 {
        return Err(AppError::new(2, "Sample row count must be > 0."));
    }
    if config.features == 0 {
        return Err(AppError::new(2, "Sample feature count must be > 0."));
    }
    if !(config.treated_share > 0.0 && config.treated_share < 1.0) {
        return Err(AppError::new(2, "Treated share must be strictly between 0 and 1."));
    }
    if !(config.base_effect.is_finite() && config.effect_shift.is_finite()) {
        return Err(AppError::new(2, "Effect settings must be finite."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be a finite value >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut values = Vec::with_capacity(config.rows * config.features);
    let mut treatment = Vec::with_capacity(config.rows);
    let mut y = Vec::with_capacity(config.rows);
    let mut true_effect = Vec::with_capacity(config.rows);

    for _ in 0..config.rows {
        let row: Vec<f64> = (0..config.features).map(|_| rng.gen_range(0.0..1.0)).collect();
        let t = u8::from(rng.gen_bool(config.treated_share));

        let effect = config.base_effect + if row[0] > EFFECT_CUT { config.effect_shift } else { 0.0 };
        let baseline: f64 = row.iter().sum();
        let outcome = baseline + f64::from(t) * effect + normal.sample(&mut rng);

        values.extend_from_slice(&row);
        treatment.push(t);
        y.push(outcome);
        true_effect.push(effect);
    }

    let feature_names = (0..config.features).map(|i| format!("x{i}")).collect();
    log::info!(
        "generated {} synthetic rows ({} treated)",
        config.rows,
        treatment.iter().filter(|&&t| t == 1).count()
    );

    Ok(SampleData {
        feature_names,
        x: DMatrix::from_row_slice(config.rows, config.features, &values),
        treatment,
        y,
        true_effect,
    })
}
