//! Scripted fitter for exercising the selection strategies without
//! training anything.
//!
//! Outcomes are keyed by state count; scores can further discriminate by
//! the row count of the observation set being scored, which is how tests
//! tell the target item, other items, and cross-validation folds apart.

use crate::corpus::ObservationSet;
use crate::fit::{FitError, FittedModel, ModelFitter, ScoreError};
use std::collections::{BTreeMap, BTreeSet};

/// How a scripted model scores an observation set.
#[derive(Debug, Clone)]
pub enum ScriptedScore {
    /// Same log-likelihood for every observation set.
    Constant(f64),
    /// Log-likelihood keyed by the observation set's row count; unknown
    /// row counts fail to score.
    ByRows(BTreeMap<usize, f64>),
    /// Every scoring attempt fails.
    Fail,
}

/// A pre-scripted "fitted model".
#[derive(Debug, Clone)]
pub struct ScriptedModel {
    num_states: usize,
    num_features: usize,
    score: ScriptedScore,
}

impl FittedModel for ScriptedModel {
    fn num_states(&self) -> usize {
        self.num_states
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn log_likelihood(&self, observations: &ObservationSet) -> Result<f64, ScoreError> {
        match &self.score {
            ScriptedScore::Constant(value) => Ok(*value),
            ScriptedScore::ByRows(map) => map
                .get(&observations.num_rows())
                .copied()
                .ok_or(ScoreError::NonFinite),
            ScriptedScore::Fail => Err(ScoreError::NonFinite),
        }
    }
}

/// A fitter that replays scripted outcomes instead of training.
#[derive(Debug, Clone)]
pub struct ScriptedFitter {
    outcomes: BTreeMap<usize, Option<ScriptedScore>>,
    fail_on: BTreeSet<(usize, usize)>,
    num_features: usize,
}

impl ScriptedFitter {
    /// Fitter with no scripted outcomes; every fit fails until scripted.
    pub fn new(num_features: usize) -> Self {
        Self {
            outcomes: BTreeMap::new(),
            fail_on: BTreeSet::new(),
            num_features,
        }
    }

    /// Script a successful fit at `num_states`.
    pub fn succeeds(mut self, num_states: usize, score: ScriptedScore) -> Self {
        self.outcomes.insert(num_states, Some(score));
        self
    }

    /// Script a failing fit at `num_states`.
    pub fn fails(mut self, num_states: usize) -> Self {
        self.outcomes.insert(num_states, None);
        self
    }

    /// Fail the fit at `num_states` when the training set has exactly
    /// `rows` rows. Used to fail individual CV folds of one candidate.
    pub fn fails_on(mut self, num_states: usize, rows: usize) -> Self {
        self.fail_on.insert((num_states, rows));
        self
    }
}

impl ModelFitter for ScriptedFitter {
    type Model = ScriptedModel;

    fn fit(
        &self,
        observations: &ObservationSet,
        num_states: usize,
    ) -> Result<ScriptedModel, FitError> {
        if self.fail_on.contains(&(num_states, observations.num_rows())) {
            return Err(FitError::TooFewObservations {
                rows: observations.num_rows(),
                num_states,
            });
        }
        match self.outcomes.get(&num_states) {
            Some(Some(score)) => Ok(ScriptedModel {
                num_states,
                num_features: self.num_features,
                score: score.clone(),
            }),
            Some(None) => Err(FitError::Diverged { iteration: 0 }),
            None => Err(FitError::InvalidStateCount(num_states)),
        }
    }
}
