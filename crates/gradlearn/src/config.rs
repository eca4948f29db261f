use std::fs;
use std::path::Path;

use gradlearn_linear::{DescentConfig, LearningRateReduction, ModelKind, UpdateRule};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One learner: a scorer, an update rule and its learning-rate schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub model: ModelKind,
    pub update: UpdateRule,
    pub learning_rate: f64,
    #[serde(default)]
    pub reduction: LearningRateReduction,
}

impl RunConfig {
    pub fn new(model: ModelKind, update: UpdateRule, learning_rate: f64) -> Self {
        RunConfig {
            model,
            update,
            learning_rate,
            reduction: LearningRateReduction::Fixed,
        }
    }

    pub fn with_reduction(mut self, reduction: LearningRateReduction) -> Self {
        self.reduction = reduction;
        self
    }

    /// `dynamic{lr}` when the rate backs off, `{lr}` otherwise.
    pub fn rate_label(&self) -> String {
        if self.reduction.is_dynamic() {
            format!("dynamic{}", self.learning_rate)
        } else {
            self.learning_rate.to_string()
        }
    }

    pub fn descent_config(&self, max_ratio: f64, max_passes: Option<usize>) -> DescentConfig {
        DescentConfig {
            learning_rate: self.learning_rate,
            reduction: self.reduction,
            update: self.update,
            max_ratio,
            max_passes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub fold_count: usize,
    /// Index of the held-out fold.
    pub test_fold: usize,
    /// Seed for the training-set shuffle.
    pub seed: u64,
    pub max_ratio: f64,
    pub max_passes: Option<usize>,
    /// Z-score every feature column before splitting.
    pub normalize: bool,
    /// Prepend the constant bias feature.
    pub add_bias: bool,
    pub runs: Vec<RunConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        ExperimentConfig {
            fold_count: 10,
            test_fold: 0,
            seed: 1337,
            max_ratio: 0.99,
            max_passes: None,
            normalize: true,
            add_bias: true,
            runs: vec![
                RunConfig::new(ModelKind::Linear, UpdateRule::StochasticPass, 0.0001),
                RunConfig::new(ModelKind::Linear, UpdateRule::Batch, 1.0)
                    .with_reduction(LearningRateReduction::Divide { factor: 10.0 }),
                RunConfig::new(ModelKind::Logistic, UpdateRule::StochasticPass, 0.1),
                RunConfig::new(ModelKind::Logistic, UpdateRule::Batch, 0.01),
            ],
        }
    }
}

impl ExperimentConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ExperimentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = Some(max_passes);
        self
    }

    pub fn with_runs(mut self, runs: Vec<RunConfig>) -> Self {
        self.runs = runs;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fold_count < 2 {
            return Err(ConfigError::Invalid(format!(
                "fold_count must be at least 2, got {}",
                self.fold_count
            )));
        }
        if self.test_fold >= self.fold_count {
            return Err(ConfigError::Invalid(format!(
                "test_fold {} out of range for {} folds",
                self.test_fold, self.fold_count
            )));
        }
        // accepted ratios never exceed 1, so the loop could never stop
        if !(self.max_ratio > 0.0 && self.max_ratio < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "max_ratio must lie in (0, 1), got {}",
                self.max_ratio
            )));
        }
        for run in &self.runs {
            if !(run.learning_rate > 0.0 && run.learning_rate.is_finite()) {
                return Err(ConfigError::Invalid(format!(
                    "learning_rate must be positive, got {}",
                    run.learning_rate
                )));
            }
            if let LearningRateReduction::Divide { factor } = run.reduction {
                if factor <= 1.0 {
                    return Err(ConfigError::Invalid(format!(
                        "divide factor must exceed 1, got {}",
                        factor
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Read and validate an experiment configuration from a JSON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExperimentConfig, ConfigError> {
    let json = fs::read_to_string(path)?;
    ExperimentConfig::from_json(&json)
}
