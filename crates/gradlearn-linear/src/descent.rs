//! Gradient descent with learning-rate backoff.
//!
//! Each pass proposes a candidate weight vector. The candidate is kept only
//! if training RMSE does not rise; otherwise the learning rate is reduced and
//! the pass is retried from the same weights. Learning stops once an
//! accepted pass improves RMSE by less than `1 - max_ratio`.
//!
//! There is no iteration cap unless `max_passes` is set. A pathological
//! `max_ratio` (or a reduction that never shrinks the rate) can loop forever.

use gradlearn_core::stats::root_mean_squared_error;
use gradlearn_core::{Dataset, LabeledExample, LearnError, LearnResult};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::model::Scorer;

/// How one pass over the training set turns weights into candidate weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    /// Update after every example, in set order.
    StochasticPass,
    /// Sum the gradient over the whole set, then update once.
    Batch,
}

impl UpdateRule {
    pub fn name(self) -> &'static str {
        match self {
            UpdateRule::StochasticPass => "stochastic_pass",
            UpdateRule::Batch => "batch",
        }
    }

    pub fn apply<S: Scorer + ?Sized>(
        self,
        weights: &[f64],
        data: &Dataset,
        scorer: &S,
        learning_rate: f64,
    ) -> Vec<f64> {
        match self {
            UpdateRule::StochasticPass => stochastic_pass(weights, data, scorer, learning_rate),
            UpdateRule::Batch => batch_pass(weights, data, scorer, learning_rate),
        }
    }
}

/// Single-example update: `w[j] -= lr * gradient(score(w, x), x[j], y)`.
///
/// The score is taken before any coordinate moves.
pub fn stochastic_step<S: Scorer + ?Sized>(
    weights: &[f64],
    example: &LabeledExample,
    scorer: &S,
    learning_rate: f64,
) -> Vec<f64> {
    let s = scorer.score(weights, &example.features);
    weights
        .iter()
        .zip(example.features.iter())
        .map(|(&w, &x)| w - learning_rate * scorer.gradient(s, x, example.label))
        .collect()
}

/// One online pass: every example sees the weights left by the previous one.
pub fn stochastic_pass<S: Scorer + ?Sized>(
    weights: &[f64],
    data: &Dataset,
    scorer: &S,
    learning_rate: f64,
) -> Vec<f64> {
    data.iter().fold(weights.to_vec(), |w, ex| {
        stochastic_step(&w, ex, scorer, learning_rate)
    })
}

/// One batch pass: gradients summed against the weights fixed at the start.
pub fn batch_pass<S: Scorer + ?Sized>(
    weights: &[f64],
    data: &Dataset,
    scorer: &S,
    learning_rate: f64,
) -> Vec<f64> {
    let mut grad = vec![0.0; weights.len()];
    for ex in data {
        let s = scorer.score(weights, &ex.features);
        for (g, &x) in grad.iter_mut().zip(ex.features.iter()) {
            *g += scorer.gradient(s, x, ex.label);
        }
    }
    weights
        .iter()
        .zip(grad.iter())
        .map(|(&w, &g)| w - learning_rate * g)
        .collect()
}

/// Learning-rate reduction applied after a rejected pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningRateReduction {
    /// Keep the rate. A rejected pass is retried unchanged.
    #[default]
    Fixed,
    /// Divide the rate by `factor`.
    Divide { factor: f64 },
}

impl LearningRateReduction {
    pub fn apply(self, learning_rate: f64) -> f64 {
        match self {
            LearningRateReduction::Fixed => learning_rate,
            LearningRateReduction::Divide { factor } => learning_rate / factor,
        }
    }

    pub fn is_dynamic(self) -> bool {
        !matches!(self, LearningRateReduction::Fixed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescentConfig {
    pub learning_rate: f64,
    #[serde(default)]
    pub reduction: LearningRateReduction,
    pub update: UpdateRule,
    /// Stop once `new_rmse / old_rmse` of an accepted pass exceeds this.
    pub max_ratio: f64,
    /// Optional ceiling on passes (accepted and rejected).
    #[serde(default)]
    pub max_passes: Option<usize>,
}

impl Default for DescentConfig {
    fn default() -> Self {
        DescentConfig {
            learning_rate: 0.01,
            reduction: LearningRateReduction::Fixed,
            update: UpdateRule::Batch,
            max_ratio: 0.99,
            max_passes: None,
        }
    }
}

impl DescentConfig {
    pub fn new(learning_rate: f64, update: UpdateRule) -> Self {
        DescentConfig {
            learning_rate,
            update,
            ..Default::default()
        }
    }

    pub fn with_reduction(mut self, reduction: LearningRateReduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_max_ratio(mut self, max_ratio: f64) -> Self {
        self.max_ratio = max_ratio;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }
}

/// How a training loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    Converged,
    /// The pass ceiling was hit first; the weights are the last accepted ones.
    PassLimitReached,
}

/// Outcome of a gradient descent run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descent {
    pub weights: Vec<f64>,
    /// Training RMSE of `weights`.
    pub rmse: f64,
    /// Learning rate in effect when the loop ended.
    pub learning_rate: f64,
    pub accepted: usize,
    pub rejected: usize,
    /// Training RMSE after initialization and after every accepted pass.
    pub history: Vec<f64>,
    /// Ratio of the last accepted pass, if any pass was accepted.
    pub final_ratio: Option<f64>,
    pub status: Convergence,
}

impl Descent {
    pub fn is_converged(&self) -> bool {
        self.status == Convergence::Converged
    }
}

pub struct GradientDescent {
    pub config: DescentConfig,
}

impl GradientDescent {
    pub fn new(config: DescentConfig) -> Self {
        GradientDescent { config }
    }

    /// Train from `initial_weights` using the configured rate reduction.
    pub fn run<S: Scorer + ?Sized>(
        &self,
        initial_weights: Vec<f64>,
        training: &Dataset,
        scorer: &S,
    ) -> LearnResult<Descent> {
        let reduction = self.config.reduction;
        if let LearningRateReduction::Divide { factor } = reduction {
            if !(factor > 1.0 && factor.is_finite()) {
                return Err(LearnError::InvalidParameter(format!(
                    "divide factor must be finite and exceed 1, got {}",
                    factor
                )));
            }
        }
        self.run_with_reduction(initial_weights, training, scorer, |lr| reduction.apply(lr))
    }

    /// Train with a caller-supplied rate reduction.
    pub fn run_with_reduction<S, R>(
        &self,
        initial_weights: Vec<f64>,
        training: &Dataset,
        scorer: &S,
        mut reduce: R,
    ) -> LearnResult<Descent>
    where
        S: Scorer + ?Sized,
        R: FnMut(f64) -> f64,
    {
        if training.is_empty() {
            return Err(LearnError::EmptyInput("training set"));
        }
        if initial_weights.len() != training.n_features() {
            return Err(LearnError::DimensionMismatch {
                expected: training.n_features(),
                got: initial_weights.len(),
            });
        }
        let cfg = &self.config;
        if !(cfg.learning_rate > 0.0 && cfg.learning_rate.is_finite()) {
            return Err(LearnError::InvalidParameter(format!(
                "learning rate must be positive and finite, got {}",
                cfg.learning_rate
            )));
        }

        let labels = training.labels();
        let mut learning_rate = cfg.learning_rate;
        let mut weights = initial_weights;
        let mut error = dataset_rmse(&weights, training, scorer, &labels)?;
        if !error.is_finite() {
            return Err(LearnError::NumericOverflow(
                "training RMSE of the initial weights is not finite".into(),
            ));
        }
        info!("initial learning rate: {}", learning_rate);
        info!("initial training RMSE: {}", error);

        let mut history = vec![error];
        let mut accepted = 0usize;
        let mut rejected = 0usize;
        let mut final_ratio = None;

        loop {
            if let Some(limit) = cfg.max_passes {
                if accepted + rejected >= limit {
                    warn!(
                        "did not converge within {} passes; training RMSE {}",
                        limit, error
                    );
                    return Ok(Descent {
                        weights,
                        rmse: error,
                        learning_rate,
                        accepted,
                        rejected,
                        history,
                        final_ratio,
                        status: Convergence::PassLimitReached,
                    });
                }
            }

            let candidate = cfg.update.apply(&weights, training, scorer, learning_rate);
            let new_error = dataset_rmse(&candidate, training, scorer, &labels)?;

            // NaN and infinity both count as worse than the current error
            if new_error.is_finite() && new_error <= error {
                let ratio = if error == 0.0 { 1.0 } else { new_error / error };
                accepted += 1;
                debug!(
                    "pass {}: training RMSE v {} (ratio {})",
                    accepted + rejected,
                    new_error,
                    ratio
                );
                error = new_error;
                weights = candidate;
                history.push(error);
                final_ratio = Some(ratio);

                if ratio > cfg.max_ratio {
                    info!(
                        "finished learning after {} passes; error ratio {} > {}",
                        accepted + rejected,
                        ratio,
                        cfg.max_ratio
                    );
                    return Ok(Descent {
                        weights,
                        rmse: error,
                        learning_rate,
                        accepted,
                        rejected,
                        history,
                        final_ratio,
                        status: Convergence::Converged,
                    });
                }
            } else {
                rejected += 1;
                if new_error.is_finite() {
                    debug!("pass {}: training RMSE ^ {}", accepted + rejected, new_error);
                } else {
                    debug!("pass {}: training RMSE overflow", accepted + rejected);
                }
                learning_rate = reduce(learning_rate);
                debug!("retrying with learning rate: {}", learning_rate);
            }
        }
    }
}

/// RMSE between model scores and `labels` over every example of `data`.
pub fn dataset_rmse<S: Scorer + ?Sized>(
    weights: &[f64],
    data: &Dataset,
    scorer: &S,
    labels: &[f64],
) -> LearnResult<f64> {
    let scores: Vec<f64> = data
        .iter()
        .map(|ex| scorer.score(weights, &ex.features))
        .collect();
    root_mean_squared_error(&scores, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinearScorer, LogisticScorer};
    use approx::assert_abs_diff_eq;
    use gradlearn_core::synthetic::make_binary_blobs;

    // label = 2 * feature, no bias column
    fn doubling() -> Dataset {
        Dataset::from_rows(
            vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
            vec![2.0, 4.0, 6.0, 8.0],
        )
        .unwrap()
    }

    fn assert_non_increasing(history: &[f64]) {
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0], "RMSE rose: {:?}", pair);
        }
    }

    #[test]
    fn test_stochastic_step() {
        let ex = LabeledExample::new(vec![1.0, 2.0], 1.0);
        // score 0; gradient (0 - 1) * x_j
        let w = stochastic_step(&[0.0, 0.0], &ex, &LinearScorer, 0.5);
        assert_eq!(w, vec![0.5, 1.0]);
    }

    #[test]
    fn test_stochastic_pass_is_online() {
        let data = Dataset::from_rows(vec![vec![1.0], vec![1.0]], vec![1.0, 1.0]).unwrap();
        // first example: 0 -> 0.5; second sees 0.5: 0.5 - 0.5 * (0.5 - 1) = 0.75
        let w = stochastic_pass(&[0.0], &data, &LinearScorer, 0.5);
        assert_eq!(w, vec![0.75]);
        // a frozen snapshot would give 0.5 per example, summed: 1.0
        let b = batch_pass(&[0.0], &data, &LinearScorer, 0.5);
        assert_eq!(b, vec![1.0]);
    }

    #[test]
    fn test_batch_fits_doubling() {
        let config = DescentConfig::new(0.01, UpdateRule::Batch)
            .with_reduction(LearningRateReduction::Divide { factor: 10.0 })
            .with_max_passes(10_000);
        let fit = GradientDescent::new(config)
            .run(vec![0.0], &doubling(), &LinearScorer)
            .unwrap();

        assert!(fit.is_converged());
        assert_abs_diff_eq!(fit.weights[0], 2.0, epsilon = 1e-6);
        assert_eq!(fit.history.len(), fit.accepted + 1);
        assert_non_increasing(&fit.history);
    }

    #[test]
    fn test_stochastic_fits_doubling() {
        let config = DescentConfig::new(0.01, UpdateRule::StochasticPass)
            .with_reduction(LearningRateReduction::Divide { factor: 10.0 })
            .with_max_passes(10_000);
        let fit = GradientDescent::new(config)
            .run(vec![0.0], &doubling(), &LinearScorer)
            .unwrap();

        assert!(fit.is_converged());
        assert_abs_diff_eq!(fit.weights[0], 2.0, epsilon = 1e-6);
        assert_non_increasing(&fit.history);
    }

    #[test]
    fn test_backoff_after_overshoot() {
        // lr 1.0 and 0.1 both overshoot on this data; 0.01 contracts
        let config = DescentConfig::new(1.0, UpdateRule::Batch)
            .with_reduction(LearningRateReduction::Divide { factor: 10.0 })
            .with_max_passes(10_000);
        let fit = GradientDescent::new(config)
            .run(vec![0.0], &doubling(), &LinearScorer)
            .unwrap();

        assert!(fit.is_converged());
        assert!(fit.rejected >= 2);
        assert!(fit.learning_rate <= 0.01 + 1e-12);
        assert_abs_diff_eq!(fit.weights[0], 2.0, epsilon = 1e-6);
        assert_non_increasing(&fit.history);
    }

    #[test]
    fn test_overflow_counts_as_worse() {
        // the first candidate squares past f64::MAX
        let config = DescentConfig::new(1e200, UpdateRule::Batch)
            .with_reduction(LearningRateReduction::Divide { factor: 10.0 })
            .with_max_passes(10_000);
        let fit = GradientDescent::new(config)
            .run(vec![0.0], &doubling(), &LinearScorer)
            .unwrap();

        assert!(fit.is_converged());
        assert!(fit.rejected > 100);
        assert_abs_diff_eq!(fit.weights[0], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pass_limit() {
        // a fixed rate that always overshoots never gets accepted
        let config = DescentConfig::new(1.0, UpdateRule::Batch).with_max_passes(5);
        let fit = GradientDescent::new(config)
            .run(vec![0.0], &doubling(), &LinearScorer)
            .unwrap();

        assert_eq!(fit.status, Convergence::PassLimitReached);
        assert_eq!(fit.weights, vec![0.0]);
        assert_eq!(fit.accepted, 0);
        assert_eq!(fit.rejected, 5);
        assert_eq!(fit.final_ratio, None);
    }

    #[test]
    fn test_custom_reduction() {
        let mut calls = 0;
        let config = DescentConfig::new(1.0, UpdateRule::Batch).with_max_passes(10_000);
        let fit = GradientDescent::new(config)
            .run_with_reduction(vec![0.0], &doubling(), &LinearScorer, |lr| {
                calls += 1;
                lr * 0.05
            })
            .unwrap();
        assert!(fit.is_converged());
        assert_eq!(calls, fit.rejected);
    }

    #[test]
    fn test_exact_fit_stops() {
        let fit = GradientDescent::new(DescentConfig::default())
            .run(vec![2.0], &doubling(), &LinearScorer)
            .unwrap();
        assert!(fit.is_converged());
        assert_eq!(fit.accepted, 1);
        assert_eq!(fit.rmse, 0.0);
    }

    #[test]
    fn test_logistic_descent_improves() {
        let data = make_binary_blobs(60, 2, 4.0, Some(3)).with_bias();
        let config = DescentConfig::new(0.1, UpdateRule::Batch)
            .with_reduction(LearningRateReduction::Divide { factor: 2.0 })
            .with_max_passes(100_000);
        let fit = GradientDescent::new(config)
            .run(vec![0.0; 3], &data, &LogisticScorer)
            .unwrap();

        assert!(fit.is_converged());
        assert!(fit.rmse < fit.history[0]);
        assert_non_increasing(&fit.history);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let gd = GradientDescent::new(DescentConfig::default());
        assert_eq!(
            gd.run(vec![0.0, 0.0], &doubling(), &LinearScorer).unwrap_err(),
            LearnError::DimensionMismatch { expected: 1, got: 2 }
        );
        let empty = Dataset::new(Vec::new()).unwrap();
        assert!(gd.run(Vec::new(), &empty, &LinearScorer).is_err());

        let gd = GradientDescent::new(DescentConfig::new(0.0, UpdateRule::Batch));
        assert!(gd.run(vec![0.0], &doubling(), &LinearScorer).is_err());
    }

    #[test]
    fn test_rejects_non_shrinking_divide() {
        for factor in [0.0, 0.5, 1.0, f64::NAN] {
            let config = DescentConfig::new(0.01, UpdateRule::Batch)
                .with_reduction(LearningRateReduction::Divide { factor });
            assert!(matches!(
                GradientDescent::new(config).run(vec![0.0], &doubling(), &LinearScorer),
                Err(LearnError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_dataset_rmse() {
        let data = doubling();
        let rmse = dataset_rmse(&[2.0], &data, &LinearScorer, &data.labels()).unwrap();
        assert_eq!(rmse, 0.0);
        // scores 1..4 against labels 2..8: errors 1..4, mean square 7.5
        let rmse = dataset_rmse(&[1.0], &data, &LinearScorer, &data.labels()).unwrap();
        assert_abs_diff_eq!(rmse, 7.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_stochastic_pass_chains_steps() {
        let data = Dataset::from_rows(vec![vec![1.0, 2.0], vec![1.0, -1.0]], vec![1.0, 0.0]).unwrap();
        let first = stochastic_step(&[0.1, 0.2], &data.examples()[0], &LinearScorer, 0.1);
        let second = stochastic_step(&first, &data.examples()[1], &LinearScorer, 0.1);
        assert_eq!(stochastic_pass(&[0.1, 0.2], &data, &LinearScorer, 0.1), second);
    }
}
