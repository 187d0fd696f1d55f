//! HMM Topology Selection Core Library
//!
//! This library picks, for each item in a labeled collection of
//! variable-length observation sequences, the best-fitting hidden-state
//! count among candidate sizes:
//!
//! - Corpus types: observation sets and the labeled collection
//! - Fitting boundary: the `ModelFitter` seam plus the default seeded
//!   diagonal-covariance Gaussian HMM trainer
//! - Selection strategies: fixed, BIC, DIC, and cross-validated
//!
//! Drivers iterate item labels, build a [`SelectionContext`] per item, and
//! hand it to a [`SelectionPolicy`]. All candidate-level failures stay
//! inside the strategies; the only caller-visible failure is a `None`
//! result when even the fixed-size fallback cannot be fitted.

pub mod config;
pub mod corpus;
pub mod fit;
pub mod select;

// Re-export scripted fitter for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use config::{ConfigError, SelectionConfig};
pub use corpus::{Collection, CorpusError, ObservationSet, Sequence};
pub use fit::{DiagGaussianHmm, FitError, FittedModel, HmmFitter, ModelFitter, ScoreError};
pub use select::{SelectionContext, SelectionError, SelectionPolicy};
