use gradlearn_core::stats::{dot_product, logistic};
use serde::{Deserialize, Serialize};

/// A scoring function and the per-coordinate gradient of its squared error.
///
/// The gradient takes the already computed score so a pass over one example
/// scores it once and reuses the value for every coordinate.
pub trait Scorer {
    /// Short lowercase name used in reports and artifact names.
    fn name(&self) -> &'static str;

    fn score(&self, weights: &[f64], features: &[f64]) -> f64;

    fn gradient(&self, score: f64, feature: f64, label: f64) -> f64;
}

/// Linear regression: `s = w·x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScorer;

impl Scorer for LinearScorer {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn score(&self, weights: &[f64], features: &[f64]) -> f64 {
        dot_product(weights, features)
    }

    /// `(s - y) * x_j`
    fn gradient(&self, score: f64, feature: f64, label: f64) -> f64 {
        (score - label) * feature
    }
}

/// Logistic regression: `s = σ(w·x)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticScorer;

impl Scorer for LogisticScorer {
    fn name(&self) -> &'static str {
        "logisticregression"
    }

    fn score(&self, weights: &[f64], features: &[f64]) -> f64 {
        logistic(dot_product(weights, features))
    }

    /// `s(1 - s) * (s - y) * x_j`
    fn gradient(&self, score: f64, feature: f64, label: f64) -> f64 {
        score * (1.0 - score) * LinearScorer.gradient(score, feature, label)
    }
}

/// Serializable selector for the built-in scorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    Logistic,
}

impl ModelKind {
    pub fn scorer(self) -> Box<dyn Scorer> {
        match self {
            ModelKind::Linear => Box::new(LinearScorer),
            ModelKind::Logistic => Box::new(LogisticScorer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_scorer() {
        let w = [1.0, 2.0];
        let x = [1.0, 3.0];
        assert_eq!(LinearScorer.score(&w, &x), 7.0);
        // (7 - 5) * 3
        assert_eq!(LinearScorer.gradient(7.0, 3.0, 5.0), 6.0);
    }

    #[test]
    fn test_logistic_scorer() {
        assert_eq!(LogisticScorer.score(&[0.0, 0.0], &[4.0, -2.0]), 0.5);
        // 0.5 * 0.5 * (0.5 - 1) * 2
        assert!((LogisticScorer.gradient(0.5, 2.0, 1.0) + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_model_kind() {
        assert_eq!(ModelKind::Linear.scorer().name(), "regression");
        assert_eq!(ModelKind::Logistic.scorer().name(), "logisticregression");
    }
}
