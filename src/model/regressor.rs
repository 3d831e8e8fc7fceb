//! The uplift tree regressor: configuration, fit state and prediction.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::domain::{TrainingSet, UpliftConfig};
use crate::error::UpliftError;
use crate::fit::TreeBuilder;
use crate::tree::Node;

/// A fitted tree plus the feature count it was trained on.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedTree {
    pub n_features: usize,
    pub root: Node,
}

/// Decision tree estimating heterogeneous treatment effects.
///
/// Starts unfitted. `fit` grows a tree; calling `fit` again replaces the
/// previous tree (and feature count) entirely. Prediction only reads the
/// tree, so a fitted model can be shared across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct UpliftTreeRegressor {
    config: UpliftConfig,
    fitted: Option<FittedTree>,
}

impl Default for UpliftTreeRegressor {
    fn default() -> Self {
        Self {
            config: UpliftConfig::default(),
            fitted: None,
        }
    }
}

impl UpliftTreeRegressor {
    pub fn new(config: UpliftConfig) -> Result<Self, UpliftError> {
        config.validate()?;
        Ok(Self { config, fitted: None })
    }

    /// Rebuild a fitted model from a previously grown tree.
    ///
    /// Every split must reference a feature below `n_features`.
    pub fn from_tree(config: UpliftConfig, n_features: usize, root: Node) -> Result<Self, UpliftError> {
        config.validate()?;
        check_split_features(&root, n_features)?;
        Ok(Self {
            config,
            fitted: Some(FittedTree { n_features, root }),
        })
    }

    pub fn config(&self) -> &UpliftConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn tree(&self) -> Option<&Node> {
        self.fitted.as_ref().map(|f| &f.root)
    }

    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    /// Fit the tree on `x` (rows × features), binary `treatment` and outcome `y`.
    ///
    /// Inputs are validated before any work starts. On error the model keeps
    /// whatever state it had before the call.
    pub fn fit(&mut self, x: &DMatrix<f64>, treatment: &[u8], y: &[f64]) -> Result<(), UpliftError> {
        let data = TrainingSet::new(x, treatment, y)?;
        let root = TreeBuilder::new(data, self.config).build()?;

        log::info!(
            "fitted uplift tree: {} rows, {} features, depth {}, {} leaves, root effect {:.6}",
            data.n_rows(),
            data.n_features(),
            root.depth(),
            root.n_leaves(),
            root.effect_estimate()
        );

        self.fitted = Some(FittedTree {
            n_features: data.n_features(),
            root,
        });
        Ok(())
    }

    /// Predict the effect for one row of feature values.
    pub fn predict_one(&self, row: &[f64]) -> Result<f64, UpliftError> {
        let fitted = self.fitted_tree()?;
        if row.len() != fitted.n_features {
            return Err(UpliftError::FeatureCountMismatch {
                expected: fitted.n_features,
                got: row.len(),
            });
        }
        Ok(fitted.root.leaf_for(|f| row[f]).effect_estimate())
    }

    /// Predict the effect for every row of `x`, in row order.
    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, UpliftError> {
        let fitted = self.fitted_tree()?;
        if x.ncols() != fitted.n_features {
            return Err(UpliftError::FeatureCountMismatch {
                expected: fitted.n_features,
                got: x.ncols(),
            });
        }

        let root = &fitted.root;
        Ok((0..x.nrows())
            .into_par_iter()
            .map(|r| root.leaf_for(|f| x[(r, f)]).effect_estimate())
            .collect())
    }

    fn fitted_tree(&self) -> Result<&FittedTree, UpliftError> {
        self.fitted.as_ref().ok_or(UpliftError::NotFitted)
    }
}

fn check_split_features(node: &Node, n_features: usize) -> Result<(), UpliftError> {
    if let (Some(split), Some((left, right))) = (node.split(), node.children()) {
        if split.feature >= n_features {
            return Err(UpliftError::InvalidModel(format!(
                "split on feature {} but the model has {n_features} features",
                split.feature
            )));
        }
        check_split_features(left, n_features)?;
        check_split_features(right, n_features)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{NodeStats, Split};

    fn small_config() -> UpliftConfig {
        UpliftConfig {
            max_depth: 2,
            min_samples_leaf: 4,
            min_samples_leaf_treated: 2,
            min_samples_leaf_control: 2,
        }
    }

    fn step(n: usize, cut: usize, high: f64) -> (DMatrix<f64>, Vec<u8>, Vec<f64>) {
        let x = DMatrix::from_iterator(n, 1, (0..n).map(|i| i as f64));
        let t: Vec<u8> = (0..n).map(|i| (i % 2) as u8).collect();
        let y: Vec<f64> = (0..n)
            .map(|i| if i >= cut && i % 2 == 1 { high } else { 0.0 })
            .collect();
        (x, t, y)
    }

    #[test]
    fn predict_before_fit_fails() {
        let model = UpliftTreeRegressor::new(small_config()).unwrap();
        assert!(!model.is_fitted());
        assert_eq!(model.predict_one(&[1.0]), Err(UpliftError::NotFitted));
        assert_eq!(
            model.predict(&DMatrix::zeros(2, 1)),
            Err(UpliftError::NotFitted)
        );
    }

    #[test]
    fn fit_then_predict() {
        let (x, t, y) = step(20, 10, 10.0);
        let mut model = UpliftTreeRegressor::new(small_config()).unwrap();
        model.fit(&x, &t, &y).unwrap();

        assert!(model.is_fitted());
        assert_eq!(model.n_features(), Some(1));
        assert_eq!(model.predict_one(&[0.0]).unwrap(), 0.0);
        assert_eq!(model.predict_one(&[19.0]).unwrap(), 10.0);

        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.len(), 20);
        for (r, p) in preds.iter().enumerate() {
            assert_eq!(*p, model.predict_one(&[r as f64]).unwrap());
        }
    }

    #[test]
    fn feature_count_is_checked() {
        let (x, t, y) = step(20, 10, 10.0);
        let mut model = UpliftTreeRegressor::new(small_config()).unwrap();
        model.fit(&x, &t, &y).unwrap();

        assert_eq!(
            model.predict_one(&[1.0, 2.0]),
            Err(UpliftError::FeatureCountMismatch { expected: 1, got: 2 })
        );
        assert_eq!(
            model.predict(&DMatrix::zeros(3, 2)),
            Err(UpliftError::FeatureCountMismatch { expected: 1, got: 2 })
        );
    }

    #[test]
    fn refit_replaces_the_tree() {
        let mut model = UpliftTreeRegressor::new(small_config()).unwrap();

        let (x, t, y) = step(20, 10, 10.0);
        model.fit(&x, &t, &y).unwrap();
        let first = model.tree().cloned().unwrap();

        // Two features now, and a constant effect.
        let x2 = DMatrix::from_fn(20, 2, |r, c| (r * (c + 1)) as f64);
        let y2: Vec<f64> = t.iter().map(|&ti| f64::from(ti) * 3.0).collect();
        model.fit(&x2, &t, &y2).unwrap();

        assert_eq!(model.n_features(), Some(2));
        assert_ne!(model.tree(), Some(&first));
        assert_eq!(model.tree().map(|n| n.effect_estimate()), Some(3.0));
        assert!(model.predict_one(&[1.0]).is_err());
    }

    #[test]
    fn failed_fit_keeps_previous_state() {
        let mut model = UpliftTreeRegressor::new(small_config()).unwrap();
        let (x, t, y) = step(20, 10, 10.0);
        model.fit(&x, &t, &y).unwrap();
        let before = model.clone();

        let err = model.fit(&x, &vec![1; 20], &y).unwrap_err();
        assert!(matches!(err, UpliftError::DegenerateRoot { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn from_tree_checks_feature_bounds() {
        let stats = NodeStats {
            sample_count: 2,
            treated_count: 1,
            control_count: 1,
            effect_estimate: 0.0,
        };
        let root = Node::internal(
            stats,
            Split { feature: 3, threshold: 0.0 },
            Node::leaf(stats),
            Node::leaf(stats),
        );
        assert!(matches!(
            UpliftTreeRegressor::from_tree(small_config(), 2, root.clone()),
            Err(UpliftError::InvalidModel(_))
        ));
        assert!(UpliftTreeRegressor::from_tree(small_config(), 4, root).is_ok());
    }
}
