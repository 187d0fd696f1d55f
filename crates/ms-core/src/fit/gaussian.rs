//! Diagonal-covariance Gaussian emission distribution.

use ms_math::{log_diag_gaussian, weighted_mean, weighted_variance};
use serde::{Deserialize, Serialize};

/// Total responsibility below this is treated as a collapsed state.
pub(crate) const MIN_STATE_WEIGHT: f64 = 1e-10;

/// Per-state emission model: independent Gaussian per feature dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagGaussian {
    mean: Vec<f64>,
    var: Vec<f64>,
}

impl DiagGaussian {
    /// Build from a mean and a (floored, strictly positive) variance vector.
    pub fn new(mean: Vec<f64>, var: Vec<f64>) -> Self {
        debug_assert_eq!(mean.len(), var.len());
        debug_assert!(var.iter().all(|v| *v > 0.0));
        Self { mean, var }
    }

    /// Feature dimensionality.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Mean vector.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-dimension variance vector.
    pub fn var(&self) -> &[f64] {
        &self.var
    }

    /// Log-density at `x`.
    pub fn log_pdf(&self, x: &[f64]) -> f64 {
        log_diag_gaussian(x, &self.mean, &self.var)
    }

    /// Re-estimate from responsibility-weighted rows.
    ///
    /// Returns None when the total responsibility is too small to
    /// normalize against (the caller reports the state as collapsed).
    pub fn estimate_weighted(
        rows: &[Vec<f64>],
        weights: &[f64],
        var_floor: f64,
    ) -> Option<Self> {
        let mean = weighted_mean(rows, weights, MIN_STATE_WEIGHT)?;
        let var = weighted_variance(rows, weights, &mean, MIN_STATE_WEIGHT, var_floor)?;
        Some(Self { mean, var })
    }
}
