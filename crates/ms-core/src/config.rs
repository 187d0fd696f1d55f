//! Per-run selection configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("min_states must be at least 1")]
    MinStatesZero,

    #[error("max_states ({max}) must be at least min_states ({min})")]
    StateBoundsInverted { min: usize, max: usize },

    #[error("fallback_states must be at least 1")]
    FallbackStatesZero,

    #[error("fold_count must be at least 2, got {0}")]
    FoldCountTooSmall(usize),
}

/// Bounds and knobs for one selection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Smallest candidate hidden-state count (inclusive).
    pub min_states: usize,

    /// Largest candidate hidden-state count (inclusive).
    pub max_states: usize,

    /// State count used by the fixed strategy and as the fallback when a
    /// search produces no viable candidate.
    pub fallback_states: usize,

    /// Number of cross-validation folds (cross-validated strategy only).
    pub fold_count: usize,

    /// Seed for the fitter's deterministic initialization.
    pub random_seed: u64,

    /// Raise per-candidate diagnostics from DEBUG to INFO.
    pub verbose: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            min_states: 2,
            max_states: 10,
            fallback_states: 3,
            fold_count: 3,
            random_seed: 14,
            verbose: false,
        }
    }
}

impl SelectionConfig {
    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_states == 0 {
            return Err(ConfigError::MinStatesZero);
        }
        if self.max_states < self.min_states {
            return Err(ConfigError::StateBoundsInverted {
                min: self.min_states,
                max: self.max_states,
            });
        }
        if self.fallback_states == 0 {
            return Err(ConfigError::FallbackStatesZero);
        }
        if self.fold_count < 2 {
            return Err(ConfigError::FoldCountTooSmall(self.fold_count));
        }
        Ok(())
    }

    /// Candidate state counts in ascending scan order.
    pub fn candidate_sizes(&self) -> RangeInclusive<usize> {
        self.min_states..=self.max_states
    }
}
