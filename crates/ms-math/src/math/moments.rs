//! Weighted moment estimation for Gaussian emission updates.
//!
//! The EM M-step re-estimates per-state means and variances from
//! responsibility-weighted observations. These helpers keep that arithmetic
//! in one place and apply a variance floor so a state that concentrates on
//! near-identical rows cannot produce a zero (or negative, via rounding)
//! variance.

/// Responsibility-weighted mean of `rows`.
///
/// Returns None when the total weight is too small to normalize against
/// (the state effectively owns no observations).
pub fn weighted_mean(rows: &[Vec<f64>], weights: &[f64], min_weight: f64) -> Option<Vec<f64>> {
    debug_assert_eq!(rows.len(), weights.len());
    let dim = rows.first()?.len();

    let total: f64 = weights.iter().sum();
    if !(total > min_weight) {
        return None;
    }

    let mut mean = vec![0.0; dim];
    for (row, w) in rows.iter().zip(weights.iter()) {
        for (m, x) in mean.iter_mut().zip(row.iter()) {
            *m += w * x;
        }
    }
    for m in mean.iter_mut() {
        *m /= total;
    }
    Some(mean)
}

/// Responsibility-weighted diagonal variance of `rows` around `mean`.
///
/// Every component is floored at `floor`. Returns None under the same
/// degenerate-weight condition as [`weighted_mean`].
pub fn weighted_variance(
    rows: &[Vec<f64>],
    weights: &[f64],
    mean: &[f64],
    min_weight: f64,
    floor: f64,
) -> Option<Vec<f64>> {
    debug_assert_eq!(rows.len(), weights.len());

    let total: f64 = weights.iter().sum();
    if !(total > min_weight) {
        return None;
    }

    let mut var = vec![0.0; mean.len()];
    for (row, w) in rows.iter().zip(weights.iter()) {
        for ((v, x), m) in var.iter_mut().zip(row.iter()).zip(mean.iter()) {
            let diff = x - m;
            *v += w * diff * diff;
        }
    }
    for v in var.iter_mut() {
        *v = (*v / total).max(floor);
    }
    Some(var)
}

/// Unweighted per-dimension variance, floored at `floor`.
///
/// Used to seed emission variances before the first EM iteration.
pub fn global_variance(rows: &[Vec<f64>], floor: f64) -> Option<Vec<f64>> {
    let dim = rows.first()?.len();
    let n = rows.len() as f64;

    let mut mean = vec![0.0; dim];
    for row in rows {
        for (m, x) in mean.iter_mut().zip(row.iter()) {
            *m += x;
        }
    }
    for m in mean.iter_mut() {
        *m /= n;
    }

    let mut var = vec![0.0; dim];
    for row in rows {
        for ((v, x), m) in var.iter_mut().zip(row.iter()).zip(mean.iter()) {
            let diff = x - m;
            *v += diff * diff;
        }
    }
    for v in var.iter_mut() {
        *v = (*v / n).max(floor);
    }
    Some(var)
}
