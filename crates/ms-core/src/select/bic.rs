//! Bayesian Information Criterion selection.
//!
//! `BIC(n) = −2·logL(n) + p(n)·ln(N)` where `logL(n)` is the fitted
//! model's log-likelihood on the item's own observations, `N` is the
//! item's total row count, and `p(n)` is the free-parameter count of an
//! n-state diagonal-covariance Gaussian HMM over d features:
//!
//! `p(n) = n² + 2·n·d − 1`
//!
//! (full transition matrix and start distribution less the row-stochastic
//! constraints, plus a mean/variance pair per state and feature). Lower is
//! better: the criterion trades fit quality against model complexity.

use crate::corpus::ObservationSet;
use crate::fit::{FittedModel, ModelFitter, ScoreError};
use crate::select::{fit_candidate, fixed, SelectionContext};

/// Scan candidates ascending and keep the lowest BIC.
pub fn select<F: ModelFitter>(ctx: &SelectionContext<'_>, fitter: &F) -> Option<F::Model> {
    let observations = ctx.observations();
    let mut best: Option<(f64, F::Model)> = None;
    for num_states in ctx.candidate_sizes() {
        let Ok(model) = fit_candidate(ctx, fitter, observations, num_states) else {
            continue;
        };
        let Ok(score) = bic_score(&model, observations) else {
            continue;
        };
        tracing::debug!(item = ctx.label(), num_states, score, "bic candidate scored");
        // Strict comparison: ties keep the smaller state count.
        if best.as_ref().map_or(true, |(current, _)| score < *current) {
            best = Some((score, model));
        }
    }
    match best {
        Some((_, model)) => Some(model),
        None => fixed::select(ctx, fitter),
    }
}

/// BIC score of a fitted model on an observation set.
pub fn bic_score<M: FittedModel>(
    model: &M,
    observations: &ObservationSet,
) -> Result<f64, ScoreError> {
    let log_likelihood = model.log_likelihood(observations)?;
    let p = free_parameters(model.num_states(), model.num_features()) as f64;
    Ok(-2.0 * log_likelihood + p * (observations.num_rows() as f64).ln())
}

/// Free-parameter count of an n-state diagonal-covariance Gaussian HMM
/// over d features.
pub fn free_parameters(num_states: usize, num_features: usize) -> usize {
    num_states * num_states + 2 * num_states * num_features - 1
}
