//! Fixed-size strategy: no search, fit the configured fallback count.
//!
//! Also the terminal fallback every searching strategy lands on when no
//! candidate survives. A `None` here is the one caller-visible failure of
//! the whole layer.

use crate::fit::ModelFitter;
use crate::select::{fit_candidate, SelectionContext};

/// Fit the item at `fallback_states` unconditionally.
pub fn select<F: ModelFitter>(ctx: &SelectionContext<'_>, fitter: &F) -> Option<F::Model> {
    let num_states = ctx.config().fallback_states;
    fit_candidate(ctx, fitter, ctx.observations(), num_states).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectionConfig;
    use crate::corpus::Collection;
    use crate::fit::FittedModel;
    use crate::scripted::{ScriptedFitter, ScriptedScore};

    fn collection() -> Collection {
        let mut collection = Collection::new();
        collection
            .insert("alpha", vec![vec![vec![0.0], vec![1.0], vec![2.0]]])
            .unwrap();
        collection
    }

    #[test]
    fn returns_model_at_fallback_size() {
        let collection = collection();
        let config = SelectionConfig::default();
        let ctx = SelectionContext::new(&collection, "alpha", &config).unwrap();
        let fitter = ScriptedFitter::new(1).succeeds(3, ScriptedScore::Constant(-5.0));

        let model = select(&ctx, &fitter).unwrap();
        assert_eq!(model.num_states(), 3);
    }

    #[test]
    fn returns_none_when_fallback_fit_fails() {
        let collection = collection();
        let config = SelectionConfig::default();
        let ctx = SelectionContext::new(&collection, "alpha", &config).unwrap();
        let fitter = ScriptedFitter::new(1).fails(3);

        assert!(select(&ctx, &fitter).is_none());
    }
}
