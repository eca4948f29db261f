//! # gradlearn
//!
//! Binary classifiers trained from first principles, and their evaluation.
//!
//! ## Modules
//!
//! - **core**: statistics primitives, labeled datasets, folds, synthetic blobs
//! - **linear**: linear/logistic scorers, gradient descent with rate backoff, perceptron
//! - **metrics**: thresholding, confusion counts, error-minimizing threshold, ROC/AUC
//! - **io**: validated delimited-table loading, ROC artifact output
//! - **config**: JSON experiment configuration
//! - **experiment**: normalize, split, train, score and evaluate in one call

/// Statistics primitives and datasets.
pub use gradlearn_core as core;

/// Trainers.
pub use gradlearn_linear as linear;

/// Evaluation.
pub use gradlearn_metrics as metrics;

/// Loading and artifact output.
pub use gradlearn_io as io;

pub mod config;
pub mod experiment;

pub use config::{load_config, ConfigError, ExperimentConfig, RunConfig};
pub use experiment::{prepare, run, run_all, score_results, RunReport, Split};
