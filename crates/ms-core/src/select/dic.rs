//! Discriminative Information Criterion selection.
//!
//! `DIC(n) = logL_own(n) − mean over other items of logL_other(n)`, both
//! evaluated under the same model fitted on the target item (Biem, "A
//! model selection criterion for classification: application to HMM
//! topology optimization", ICDAR 2003). Higher is better: the winning size
//! fits its own item well while generalizing poorly to every other item,
//! i.e. it is maximally discriminative.
//!
//! A candidate is skipped when its own fit fails, when scoring fails
//! against any other item (no partial-credit averaging over a subset),
//! and when the collection holds no other items at all, since an empty
//! mean is undefined; a single-item collection degrades to the fixed
//! fallback.

use crate::fit::{FittedModel, ModelFitter, ScoreError};
use crate::select::{fit_candidate, fixed, SelectionContext};

/// Scan candidates ascending and keep the highest DIC.
pub fn select<F: ModelFitter>(ctx: &SelectionContext<'_>, fitter: &F) -> Option<F::Model> {
    let observations = ctx.observations();
    let mut best: Option<(f64, F::Model)> = None;
    for num_states in ctx.candidate_sizes() {
        let Ok(model) = fit_candidate(ctx, fitter, observations, num_states) else {
            continue;
        };
        let Ok(score) = dic_score(&model, ctx) else {
            continue;
        };
        tracing::debug!(item = ctx.label(), num_states, score, "dic candidate scored");
        // Strict comparison: ties keep the smaller state count.
        if best.as_ref().map_or(true, |(current, _)| score > *current) {
            best = Some((score, model));
        }
    }
    match best {
        Some((_, model)) => Some(model),
        None => fixed::select(ctx, fitter),
    }
}

/// DIC score of a model fitted on the context's item.
pub fn dic_score<M: FittedModel>(
    model: &M,
    ctx: &SelectionContext<'_>,
) -> Result<f64, ScoreError> {
    let own = model.log_likelihood(ctx.observations())?;
    let mut other_scores = Vec::new();
    for (_, item) in ctx.other_items() {
        other_scores.push(model.log_likelihood(item.observations())?);
    }
    let reference = ms_math::mean(&other_scores).ok_or(ScoreError::NoReferenceItems)?;
    Ok(own - reference)
}
