use gradlearn_core::stats::dot_product;
use gradlearn_core::{Dataset, LearnError, LearnResult};
use log::{info, warn};
use serde::Serialize;

use crate::descent::Convergence;

/// Mistake-driven perceptron over ±1 labels.
///
/// Negative examples are negated and appended after the positives, so
/// training only has to push `w·x` above zero for every example. Passes
/// repeat until one makes no mistakes. That happens only when the flipped
/// data is linearly separable through the origin (add a bias column with
/// [`Dataset::with_bias`] to allow an offset). Otherwise training never
/// finishes unless `max_passes` is set.
#[derive(Debug, Clone, Default)]
pub struct Perceptron {
    pub max_passes: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerceptronFit {
    pub weights: Vec<f64>,
    /// Mistakes made in each pass; the last entry is 0 when converged.
    pub mistakes: Vec<usize>,
    pub status: Convergence,
}

impl Perceptron {
    pub fn new() -> Self {
        Perceptron { max_passes: None }
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    pub fn fit(&self, data: &Dataset) -> LearnResult<PerceptronFit> {
        if data.is_empty() {
            return Err(LearnError::EmptyInput("perceptron training set"));
        }

        let mut positives = Vec::with_capacity(data.len());
        let mut negated = Vec::new();
        for (index, ex) in data.iter().enumerate() {
            if ex.label == 1.0 {
                positives.push(ex.features.clone());
            } else if ex.label == -1.0 {
                negated.push(ex.features.iter().map(|&f| -f).collect::<Vec<f64>>());
            } else {
                return Err(LearnError::InvalidLabel {
                    index,
                    label: ex.label,
                    expected: "perceptron labels must be -1 or 1",
                });
            }
        }
        positives.extend(negated);

        let mut weights = vec![0.0; data.n_features()];
        let mut history = Vec::new();

        loop {
            if let Some(limit) = self.max_passes {
                if history.len() >= limit {
                    warn!("perceptron did not converge within {} passes", limit);
                    return Ok(PerceptronFit {
                        weights,
                        mistakes: history,
                        status: Convergence::PassLimitReached,
                    });
                }
            }

            let mut mistakes = 0usize;
            for x in &positives {
                if dot_product(&weights, x) <= 0.0 {
                    for (w, &f) in weights.iter_mut().zip(x.iter()) {
                        *w += f;
                    }
                    mistakes += 1;
                }
            }
            history.push(mistakes);
            info!("pass {}, total mistakes {}", history.len(), mistakes);

            if mistakes == 0 {
                return Ok(PerceptronFit {
                    weights,
                    mistakes: history,
                    status: Convergence::Converged,
                });
            }
        }
    }
}

impl PerceptronFit {
    pub fn passes(&self) -> usize {
        self.mistakes.len()
    }

    /// `+1` when `w·x > 0`, else `-1`.
    pub fn classify(&self, features: &[f64]) -> f64 {
        if dot_product(&self.weights, features) > 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Weights after the bias, divided by the bias weight.
    ///
    /// Only meaningful when feature 0 is the bias column. `None` when the
    /// bias weight is zero.
    pub fn normalized_weights(&self) -> Option<Vec<f64>> {
        let (&bias, rest) = self.weights.split_first()?;
        if bias == 0.0 {
            return None;
        }
        Some(rest.iter().map(|&w| w / bias).collect())
    }
}
