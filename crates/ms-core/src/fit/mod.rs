//! Model fitting boundary.
//!
//! [`ModelFitter`] is the seam between the selection strategies and the
//! training routine: strategies only ever see `fit(observations, n) ->
//! Result<Model, FitError>` and score the result through [`FittedModel`].
//! The default implementation is [`HmmFitter`], a diagonal-covariance
//! Gaussian HMM trainer with a fixed iteration cap and seeded, fully
//! deterministic initialization. Every failure mode is a structured error;
//! nothing in this module panics on bad data or relies on ambient warning
//! state.

pub mod gaussian;
pub mod hmm;

pub use gaussian::DiagGaussian;
pub use hmm::{DiagGaussianHmm, HmmFitter};

use crate::corpus::ObservationSet;
use thiserror::Error;

/// Training failed; the candidate is not viable.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("invalid state count: {0} (must be at least 1)")]
    InvalidStateCount(usize),

    #[error("too few observations: {rows} rows for {num_states} states")]
    TooFewObservations { rows: usize, num_states: usize },

    #[error("training diverged: non-finite log-likelihood at iteration {iteration}")]
    Diverged { iteration: usize },

    #[error("state {state} collapsed: total responsibility {weight:.3e}")]
    DegenerateState { state: usize, weight: f64 },
}

/// Likelihood evaluation failed; the score is unusable.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("dimension mismatch: model expects {expected} features, observations have {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("log-likelihood is not finite")]
    NonFinite,

    #[error("no reference items to score against")]
    NoReferenceItems,
}

/// A trained model: opaque to the strategies beyond its size, feature
/// width, and ability to score observation sets.
pub trait FittedModel {
    /// Hidden-state count this model was fitted with.
    fn num_states(&self) -> usize;

    /// Feature width this model was fitted on.
    fn num_features(&self) -> usize;

    /// Total log-likelihood the model assigns to `observations`
    /// (summed over its sequences).
    fn log_likelihood(&self, observations: &ObservationSet) -> Result<f64, ScoreError>;
}

/// The training routine behind the selection strategies.
pub trait ModelFitter {
    /// Concrete model type this fitter produces.
    type Model: FittedModel;

    /// Train a model with `num_states` hidden states on `observations`.
    fn fit(&self, observations: &ObservationSet, num_states: usize)
        -> Result<Self::Model, FitError>;
}
