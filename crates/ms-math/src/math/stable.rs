//! Numerically stable primitives for log-domain likelihood math.

const LOG_2PI: f64 = 1.837_877_066_409_345_3; // ln(2*pi)

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Stable log(exp(a) + exp(b)).
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        return f64::NAN;
    }
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    if a == f64::INFINITY || b == f64::INFINITY {
        return f64::INFINITY;
    }
    let m = a.max(b);
    let diff = (a - b).abs();
    m + (-diff).exp().ln_1p()
}

/// Log-density of a diagonal-covariance Gaussian at `x`.
///
/// `mean` and `var` must have the same length as `x`; every variance must be
/// strictly positive (callers floor variances before evaluating).
pub fn log_diag_gaussian(x: &[f64], mean: &[f64], var: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), mean.len());
    debug_assert_eq!(x.len(), var.len());

    let mut log_prob = 0.0;
    for ((xi, mi), vi) in x.iter().zip(mean.iter()).zip(var.iter()) {
        let diff = xi - mi;
        log_prob += -0.5 * (diff * diff / vi + vi.ln() + LOG_2PI);
    }
    log_prob
}

/// Arithmetic mean. Returns None for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn log_sum_exp_basic() {
        let v = [0.0, 0.0];
        let out = log_sum_exp(&v);
        assert!(approx_eq(out, 2.0f64.ln(), 1e-12));
    }

    #[test]
    fn log_sum_exp_dominance() {
        let v = [-1000.0, 0.0];
        let out = log_sum_exp(&v);
        assert!(approx_eq(out, 0.0, 1e-12));
    }

    #[test]
    fn log_sum_exp_all_neg_inf() {
        let v = [f64::NEG_INFINITY, f64::NEG_INFINITY];
        let out = log_sum_exp(&v);
        assert!(out.is_infinite() && out.is_sign_negative());
    }

    #[test]
    fn log_sum_exp_nan_propagates() {
        let out = log_sum_exp(&[0.0, f64::NAN]);
        assert!(out.is_nan());
    }

    #[test]
    fn log_add_exp_matches_lse() {
        let a = 1.234;
        let b = -0.75;
        let out = log_add_exp(a, b);
        let lse = log_sum_exp(&[a, b]);
        assert!(approx_eq(out, lse, 1e-12));
    }

    #[test]
    fn log_add_exp_infinity_rules() {
        let out = log_add_exp(f64::INFINITY, 1.0);
        assert!(out.is_infinite() && out.is_sign_positive());

        let out2 = log_add_exp(f64::NEG_INFINITY, 2.0);
        assert!(approx_eq(out2, 2.0, 1e-12));
    }

    #[test]
    fn log_diag_gaussian_standard_normal_at_mean() {
        // N(0, 1) density at 0 is 1/sqrt(2*pi).
        let out = log_diag_gaussian(&[0.0], &[0.0], &[1.0]);
        let expected = -0.5 * (2.0 * PI).ln();
        assert!(approx_eq(out, expected, 1e-12));
    }

    #[test]
    fn log_diag_gaussian_factorizes_over_dims() {
        let joint = log_diag_gaussian(&[0.3, -1.2], &[0.0, 0.5], &[1.0, 2.0]);
        let d0 = log_diag_gaussian(&[0.3], &[0.0], &[1.0]);
        let d1 = log_diag_gaussian(&[-1.2], &[0.5], &[2.0]);
        assert!(approx_eq(joint, d0 + d1, 1e-12));
    }

    #[test]
    fn log_diag_gaussian_peaks_at_mean() {
        let at_mean = log_diag_gaussian(&[1.0, 2.0], &[1.0, 2.0], &[0.5, 0.5]);
        let away = log_diag_gaussian(&[2.0, 3.0], &[1.0, 2.0], &[0.5, 0.5]);
        assert!(at_mean > away);
    }

    #[test]
    fn mean_basic() {
        assert!(mean(&[]).is_none());
        assert!(approx_eq(mean(&[2.0]).unwrap(), 2.0, 1e-12));
        assert!(approx_eq(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0, 1e-12));
    }
}
