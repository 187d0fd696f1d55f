//! Diagonal-covariance Gaussian HMM: training and scoring.
//!
//! # Model
//!
//! - Hidden states: `S_t ∈ {0, …, n−1}` with start distribution π and
//!   row-stochastic transition matrix A
//! - Emissions: per-state diagonal Gaussian over the feature vector
//!
//! # Training
//!
//! [`HmmFitter`] runs Baum-Welch EM over all sequences of an observation
//! set: a scaled forward-backward pass per sequence (emission likelihoods
//! are max-shifted per step before scaling, so a step where every state is
//! improbable cannot underflow to zero), statistics pooled across
//! sequences, then closed-form re-estimation with a variance floor.
//! Initialization is fully deterministic given the seed: the first emission
//! mean is a seeded row draw, the rest follow by farthest-point traversal,
//! refined with a few k-means sweeps.
//!
//! # Scoring
//!
//! [`DiagGaussianHmm::log_likelihood`] runs a log-domain forward pass per
//! sequence (log-sum-exp recursion) and sums the per-sequence totals, so
//! scoring is stable even for observation sets the model assigns vanishing
//! probability to.

use crate::config::SelectionConfig;
use crate::corpus::ObservationSet;
use crate::fit::gaussian::{DiagGaussian, MIN_STATE_WEIGHT};
use crate::fit::{FitError, FittedModel, ModelFitter, ScoreError};
use ms_math::{global_variance, log_sum_exp};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Probabilities below this are clamped before taking logs.
const PROB_FLOOR: f64 = 1e-300;

/// k-means refinement sweeps during initialization.
const KMEANS_SWEEPS: usize = 10;

/// A trained diagonal-covariance Gaussian HMM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagGaussianHmm {
    start: Vec<f64>,
    transition: Vec<Vec<f64>>,
    states: Vec<DiagGaussian>,
}

impl DiagGaussianHmm {
    /// Assemble from explicit parameters.
    ///
    /// Start and transition rows are expected to be normalized; `states`
    /// must be non-empty and share one dimension.
    pub fn from_parts(
        start: Vec<f64>,
        transition: Vec<Vec<f64>>,
        states: Vec<DiagGaussian>,
    ) -> Self {
        debug_assert!(!states.is_empty());
        debug_assert_eq!(start.len(), states.len());
        debug_assert_eq!(transition.len(), states.len());
        Self {
            start,
            transition,
            states,
        }
    }

    /// Start distribution π.
    pub fn start_probs(&self) -> &[f64] {
        &self.start
    }

    /// Transition matrix A, row-stochastic.
    pub fn transition(&self) -> &[Vec<f64>] {
        &self.transition
    }

    /// Per-state emission distributions.
    pub fn states(&self) -> &[DiagGaussian] {
        &self.states
    }

    /// Log-domain forward pass over one sequence.
    fn log_forward(&self, rows: &[Vec<f64>]) -> f64 {
        let n = self.states.len();
        let mut alpha: Vec<f64> = (0..n)
            .map(|j| ln_floor(self.start[j]) + self.states[j].log_pdf(&rows[0]))
            .collect();
        let mut scratch = vec![0.0; n];
        for row in &rows[1..] {
            let mut next = vec![0.0; n];
            for (j, out) in next.iter_mut().enumerate() {
                for i in 0..n {
                    scratch[i] = alpha[i] + ln_floor(self.transition[i][j]);
                }
                *out = log_sum_exp(&scratch) + self.states[j].log_pdf(row);
            }
            alpha = next;
        }
        log_sum_exp(&alpha)
    }
}

fn ln_floor(p: f64) -> f64 {
    p.max(PROB_FLOOR).ln()
}

impl FittedModel for DiagGaussianHmm {
    fn num_states(&self) -> usize {
        self.states.len()
    }

    fn num_features(&self) -> usize {
        self.states[0].dim()
    }

    fn log_likelihood(&self, observations: &ObservationSet) -> Result<f64, ScoreError> {
        if observations.num_features() != self.num_features() {
            return Err(ScoreError::DimensionMismatch {
                expected: self.num_features(),
                got: observations.num_features(),
            });
        }
        let mut total = 0.0;
        for sequence in observations.sequence_slices() {
            total += self.log_forward(sequence);
        }
        if !total.is_finite() {
            return Err(ScoreError::NonFinite);
        }
        Ok(total)
    }
}

/// Baum-Welch trainer with a fixed iteration cap and seeded initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmmFitter {
    max_iters: usize,
    tol: f64,
    var_floor: f64,
    seed: u64,
}

impl HmmFitter {
    /// Trainer with default cap (1000 iterations), tolerance 1e-4, and
    /// variance floor 1e-6.
    pub fn new(seed: u64) -> Self {
        Self {
            max_iters: 1000,
            tol: 1e-4,
            var_floor: 1e-6,
            seed,
        }
    }

    /// Trainer seeded from the run configuration.
    pub fn from_config(config: &SelectionConfig) -> Self {
        Self::new(config.random_seed)
    }

    /// Override the iteration cap.
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Override the convergence tolerance on the log-likelihood delta.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Override the emission variance floor.
    pub fn with_var_floor(mut self, var_floor: f64) -> Self {
        self.var_floor = var_floor;
        self
    }

    fn initial_model(&self, observations: &ObservationSet, num_states: usize) -> DiagGaussianHmm {
        let rows = observations.rows();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let means = seeded_kmeans(rows, num_states, &mut rng);
        // rows is non-empty by ObservationSet invariant
        let var = global_variance(rows, self.var_floor)
            .unwrap_or_else(|| vec![1.0; observations.num_features()]);

        let states = means
            .into_iter()
            .map(|mean| DiagGaussian::new(mean, var.clone()))
            .collect();
        let start = vec![1.0 / num_states as f64; num_states];
        let transition = if num_states == 1 {
            vec![vec![1.0]]
        } else {
            let off = 0.2 / (num_states - 1) as f64;
            (0..num_states)
                .map(|i| {
                    (0..num_states)
                        .map(|j| if i == j { 0.8 } else { off })
                        .collect()
                })
                .collect()
        };
        DiagGaussianHmm::from_parts(start, transition, states)
    }

    /// One E-step over all sequences. None signals numerical failure.
    fn expectation(
        &self,
        model: &DiagGaussianHmm,
        observations: &ObservationSet,
    ) -> Option<SufficientStats> {
        let n = model.num_states();
        let mut stats = SufficientStats::zeros(n);
        for sequence in observations.sequence_slices() {
            accumulate_sequence(model, sequence, &mut stats)?;
        }
        Some(stats)
    }

    /// M-step: closed-form re-estimation from pooled statistics.
    fn maximization(
        &self,
        observations: &ObservationSet,
        stats: &SufficientStats,
        num_states: usize,
    ) -> Result<DiagGaussianHmm, FitError> {
        let n = num_states;

        let start_total: f64 = stats.start.iter().sum();
        let start: Vec<f64> = if start_total > MIN_STATE_WEIGHT {
            stats.start.iter().map(|s| s / start_total).collect()
        } else {
            vec![1.0 / n as f64; n]
        };

        let mut transition = vec![vec![0.0; n]; n];
        for i in 0..n {
            if stats.trans_den[i] > MIN_STATE_WEIGHT {
                for j in 0..n {
                    transition[i][j] = stats.trans_num[i][j] / stats.trans_den[i];
                }
            } else {
                // A state never left in any sequence: keep its row uniform
                for j in 0..n {
                    transition[i][j] = 1.0 / n as f64;
                }
            }
            let row_sum: f64 = transition[i].iter().sum();
            if row_sum > MIN_STATE_WEIGHT {
                for j in 0..n {
                    transition[i][j] /= row_sum;
                }
            } else {
                for j in 0..n {
                    transition[i][j] = 1.0 / n as f64;
                }
            }
        }

        let rows = observations.rows();
        let mut states = Vec::with_capacity(n);
        for j in 0..n {
            let weights: Vec<f64> = stats.gamma.iter().map(|g| g[j]).collect();
            match DiagGaussian::estimate_weighted(rows, &weights, self.var_floor) {
                Some(state) => states.push(state),
                None => {
                    let weight: f64 = weights.iter().sum();
                    return Err(FitError::DegenerateState { state: j, weight });
                }
            }
        }

        Ok(DiagGaussianHmm {
            start,
            transition,
            states,
        })
    }
}

impl ModelFitter for HmmFitter {
    type Model = DiagGaussianHmm;

    fn fit(
        &self,
        observations: &ObservationSet,
        num_states: usize,
    ) -> Result<DiagGaussianHmm, FitError> {
        if num_states == 0 {
            return Err(FitError::InvalidStateCount(0));
        }
        let rows = observations.num_rows();
        if rows < num_states {
            return Err(FitError::TooFewObservations { rows, num_states });
        }

        let mut model = self.initial_model(observations, num_states);
        let mut prev_ll = f64::NEG_INFINITY;
        for iteration in 0..self.max_iters {
            let stats = self
                .expectation(&model, observations)
                .ok_or(FitError::Diverged { iteration })?;
            let log_likelihood = stats.log_likelihood;
            if !log_likelihood.is_finite() {
                return Err(FitError::Diverged { iteration });
            }
            model = self.maximization(observations, &stats, num_states)?;
            if (log_likelihood - prev_ll).abs() < self.tol {
                tracing::debug!(iteration, log_likelihood, "em converged");
                break;
            }
            prev_ll = log_likelihood;
        }
        Ok(model)
    }
}

/// Pooled E-step statistics across sequences.
struct SufficientStats {
    log_likelihood: f64,
    /// Sum of first-step responsibilities per state.
    start: Vec<f64>,
    /// Expected transition counts ξ, summed over steps and sequences.
    trans_num: Vec<Vec<f64>>,
    /// Responsibility mass per origin state over non-final steps.
    trans_den: Vec<f64>,
    /// Per-row responsibilities, aligned with the observation set's rows.
    gamma: Vec<Vec<f64>>,
}

impl SufficientStats {
    fn zeros(n: usize) -> Self {
        Self {
            log_likelihood: 0.0,
            start: vec![0.0; n],
            trans_num: vec![vec![0.0; n]; n],
            trans_den: vec![0.0; n],
            gamma: Vec::new(),
        }
    }
}

/// Scaled forward-backward over one sequence, accumulating into `stats`.
///
/// Returns None on numerical failure (a step where no state has usable
/// emission likelihood, or a vanishing normalizer).
fn accumulate_sequence(
    model: &DiagGaussianHmm,
    rows: &[Vec<f64>],
    stats: &mut SufficientStats,
) -> Option<()> {
    let n = model.num_states();
    let t_len = rows.len();

    // Emission likelihoods, max-shifted per step so at least one state
    // keeps a representable value.
    let mut emission = vec![vec![0.0; n]; t_len];
    let mut shift = vec![0.0; t_len];
    for (t, row) in rows.iter().enumerate() {
        let log_e: Vec<f64> = model.states.iter().map(|s| s.log_pdf(row)).collect();
        let max = log_e.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return None;
        }
        shift[t] = max;
        for (j, le) in log_e.iter().enumerate() {
            emission[t][j] = (le - max).exp();
        }
    }

    // Forward pass with per-step normalization.
    let mut alpha = vec![vec![0.0; n]; t_len];
    let mut scale = vec![0.0; t_len];
    for j in 0..n {
        alpha[0][j] = model.start[j] * emission[0][j];
    }
    scale[0] = alpha[0].iter().sum();
    if !(scale[0] > 0.0) || !scale[0].is_finite() {
        return None;
    }
    for j in 0..n {
        alpha[0][j] /= scale[0];
    }
    for t in 1..t_len {
        for j in 0..n {
            let mut sum = 0.0;
            for i in 0..n {
                sum += alpha[t - 1][i] * model.transition[i][j];
            }
            alpha[t][j] = sum * emission[t][j];
        }
        scale[t] = alpha[t].iter().sum();
        if !(scale[t] > 0.0) || !scale[t].is_finite() {
            return None;
        }
        for j in 0..n {
            alpha[t][j] /= scale[t];
        }
    }

    // Backward pass reusing the forward scales.
    let mut beta = vec![vec![0.0; n]; t_len];
    for j in 0..n {
        beta[t_len - 1][j] = 1.0;
    }
    for t in (0..t_len - 1).rev() {
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += model.transition[i][j] * emission[t + 1][j] * beta[t + 1][j];
            }
            beta[t][i] = sum / scale[t + 1];
        }
    }

    // Responsibilities.
    let mut gamma = vec![vec![0.0; n]; t_len];
    for t in 0..t_len {
        let mut sum = 0.0;
        for j in 0..n {
            gamma[t][j] = alpha[t][j] * beta[t][j];
            sum += gamma[t][j];
        }
        if !(sum > 0.0) {
            return None;
        }
        for j in 0..n {
            gamma[t][j] /= sum;
        }
    }

    // Expected transition counts, normalized per step.
    for t in 0..t_len.saturating_sub(1) {
        let mut local = vec![vec![0.0; n]; n];
        let mut total = 0.0;
        for i in 0..n {
            for j in 0..n {
                let v = alpha[t][i]
                    * model.transition[i][j]
                    * emission[t + 1][j]
                    * beta[t + 1][j];
                local[i][j] = v;
                total += v;
            }
        }
        if !(total > 0.0) {
            return None;
        }
        for i in 0..n {
            for j in 0..n {
                stats.trans_num[i][j] += local[i][j] / total;
            }
        }
    }

    for j in 0..n {
        stats.start[j] += gamma[0][j];
    }
    for t in 0..t_len.saturating_sub(1) {
        for i in 0..n {
            stats.trans_den[i] += gamma[t][i];
        }
    }
    stats.log_likelihood += scale.iter().map(|s| s.ln()).sum::<f64>() + shift.iter().sum::<f64>();
    stats.gamma.extend(gamma);
    Some(())
}

/// Seeded farthest-point initialization refined with k-means sweeps.
///
/// The first center is a seeded row draw; each subsequent center is the
/// row farthest from the centers chosen so far, which keeps well-separated
/// structure from collapsing into one cluster. Fully deterministic given
/// the RNG state.
fn seeded_kmeans(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    use rand::Rng;

    let mut centers: Vec<Vec<f64>> = Vec::with_capacity(k);
    centers.push(rows[rng.random_range(0..rows.len())].clone());
    while centers.len() < k {
        let mut farthest = 0;
        let mut farthest_dist = -1.0;
        for (i, row) in rows.iter().enumerate() {
            let nearest = centers
                .iter()
                .map(|c| squared_distance(row, c))
                .fold(f64::INFINITY, f64::min);
            if nearest > farthest_dist {
                farthest_dist = nearest;
                farthest = i;
            }
        }
        centers.push(rows[farthest].clone());
    }

    let dim = rows[0].len();
    for _ in 0..KMEANS_SWEEPS {
        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for row in rows {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (j, center) in centers.iter().enumerate() {
                let dist = squared_distance(row, center);
                if dist < best_dist {
                    best_dist = dist;
                    best = j;
                }
            }
            counts[best] += 1;
            for (s, x) in sums[best].iter_mut().zip(row.iter()) {
                *s += x;
            }
        }
        for j in 0..k {
            if counts[j] > 0 {
                for (c, s) in centers[j].iter_mut().zip(sums[j].iter()) {
                    *c = s / counts[j] as f64;
                }
            }
        }
    }
    centers
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation_set(values: &[f64], lengths: Vec<usize>) -> ObservationSet {
        let rows = values.iter().map(|v| vec![*v]).collect();
        ObservationSet::new(rows, lengths).unwrap()
    }

    fn two_state_model() -> DiagGaussianHmm {
        DiagGaussianHmm::from_parts(
            vec![0.6, 0.4],
            vec![vec![0.7, 0.3], vec![0.4, 0.6]],
            vec![
                DiagGaussian::new(vec![0.0], vec![1.0]),
                DiagGaussian::new(vec![3.0], vec![1.0]),
            ],
        )
    }

    #[test]
    fn forward_matches_path_enumeration() {
        let model = two_state_model();
        let obs = observation_set(&[0.1, 2.8, 3.1], vec![3]);

        // Brute-force sum over all 2^3 state paths.
        let rows = obs.rows();
        let mut total = 0.0f64;
        for path in 0..8usize {
            let states: Vec<usize> = (0..3).map(|t| (path >> t) & 1).collect();
            let mut p = model.start_probs()[states[0]]
                * model.states()[states[0]].log_pdf(&rows[0]).exp();
            for t in 1..3 {
                p *= model.transition()[states[t - 1]][states[t]]
                    * model.states()[states[t]].log_pdf(&rows[t]).exp();
            }
            total += p;
        }

        let log_l = model.log_likelihood(&obs).unwrap();
        assert!((log_l - total.ln()).abs() < 1e-9);
    }

    #[test]
    fn single_state_model_scores_sum_of_log_pdf() {
        let state = DiagGaussian::new(vec![1.0], vec![2.0]);
        let model =
            DiagGaussianHmm::from_parts(vec![1.0], vec![vec![1.0]], vec![state.clone()]);
        let obs = observation_set(&[0.5, 1.5, 3.0], vec![2, 1]);

        let expected: f64 = obs.rows().iter().map(|row| state.log_pdf(row)).sum();
        let log_l = model.log_likelihood(&obs).unwrap();
        assert!((log_l - expected).abs() < 1e-9);
    }

    #[test]
    fn score_rejects_dimension_mismatch() {
        let model = two_state_model();
        let rows = vec![vec![0.0, 1.0], vec![1.0, 2.0]];
        let obs = ObservationSet::new(rows, vec![2]).unwrap();
        assert!(matches!(
            model.log_likelihood(&obs).unwrap_err(),
            ScoreError::DimensionMismatch {
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn fit_rejects_degenerate_requests() {
        let obs = observation_set(&[0.0, 1.0, 2.0], vec![3]);
        let fitter = HmmFitter::new(14);
        assert!(matches!(
            fitter.fit(&obs, 0).unwrap_err(),
            FitError::InvalidStateCount(0)
        ));
        assert!(matches!(
            fitter.fit(&obs, 4).unwrap_err(),
            FitError::TooFewObservations { rows: 3, num_states: 4 }
        ));
    }

    #[test]
    fn fit_is_deterministic_under_fixed_seed() {
        let values: Vec<f64> = (0..24)
            .map(|t| (if (t / 4) % 2 == 0 { 0.0 } else { 8.0 }) + 0.01 * t as f64)
            .collect();
        let obs = observation_set(&values, vec![12, 12]);
        let fitter = HmmFitter::new(14).with_max_iters(50);

        let a = fitter.fit(&obs, 2).unwrap();
        let b = fitter.fit(&obs, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fit_recovers_two_separated_regimes() {
        // Alternating tight regimes around 0 and 10, with a small slope so
        // no two rows are identical.
        let values: Vec<f64> = (0..40)
            .map(|t| (if (t / 5) % 2 == 0 { 0.0 } else { 10.0 }) + 0.001 * t as f64)
            .collect();
        let obs = observation_set(&values, vec![20, 20]);
        let fitter = HmmFitter::new(14).with_max_iters(100);

        let model = fitter.fit(&obs, 2).unwrap();
        let mut means: Vec<f64> = model.states().iter().map(|s| s.mean()[0]).collect();
        means.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((means[0] - 0.0).abs() < 1.0, "low mean {means:?}");
        assert!((means[1] - 10.0).abs() < 1.0, "high mean {means:?}");

        let log_l = model.log_likelihood(&obs).unwrap();
        assert!(log_l.is_finite());
    }

    #[test]
    fn fitted_model_reports_shape() {
        let values: Vec<f64> = (0..12).map(|t| t as f64).collect();
        let obs = observation_set(&values, vec![12]);
        let model = HmmFitter::new(14).with_max_iters(10).fit(&obs, 3).unwrap();
        assert_eq!(model.num_states(), 3);
        assert_eq!(model.num_features(), 1);
    }
}
