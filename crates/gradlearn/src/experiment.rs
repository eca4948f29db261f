//! Holdout experiments: prepare one split, then train and evaluate each
//! configured learner on it.

use std::io;
use std::path::{Path, PathBuf};

use gradlearn_core::{Dataset, LearnResult};
use gradlearn_io::{artifact_name, write_roc_file};
use gradlearn_linear::{dataset_rmse, Descent, GradientDescent, Scorer};
use gradlearn_metrics::{
    apply_threshold, area_under_curve, confusion_metrics, minimize_error_threshold, roc_curve,
    ConfusionCounts, RocPoint, ScoredResult,
};
use log::info;
use serde::Serialize;

use crate::config::{ExperimentConfig, RunConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub training: Dataset,
    pub testing: Dataset,
}

/// Normalize, add the bias column, hold out one fold and shuffle the rest.
pub fn prepare(data: Dataset, config: &ExperimentConfig) -> LearnResult<Split> {
    let data = if config.normalize {
        data.zscore_columns()?
    } else {
        data
    };
    let data = if config.add_bias { data.with_bias() } else { data };

    let (training, testing) = data.holdout(config.fold_count, config.test_fold)?;
    let training = training.shuffled(config.seed);
    info!("testing count: {}", testing.len());
    info!("training count: {}", training.len());
    Ok(Split { training, testing })
}

/// Score every example of `data` with the trained weights.
pub fn score_results<S: Scorer + ?Sized>(
    weights: &[f64],
    data: &Dataset,
    scorer: &S,
) -> Vec<ScoredResult> {
    data.iter()
        .map(|ex| ScoredResult::new(ex.label, scorer.score(weights, &ex.features)))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub model: String,
    pub optimizer: String,
    pub rate_label: String,
    pub descent: Descent,
    pub test_rmse: f64,
    pub roc: Vec<RocPoint>,
    pub auc: f64,
    /// Threshold found by the error-minimizing walk.
    pub operating_point: f64,
    pub confusion: ConfusionCounts,
}

impl RunReport {
    pub fn artifact_name(&self) -> String {
        artifact_name(&self.model, &self.optimizer, &self.rate_label, self.auc)
    }

    /// Write the ROC table under `dir`, named by [`RunReport::artifact_name`].
    pub fn write_roc<P: AsRef<Path>>(&self, dir: P) -> io::Result<PathBuf> {
        write_roc_file(dir, &self.artifact_name(), &self.roc)
    }
}

/// Train one learner from zero weights and evaluate it on the held-out fold.
pub fn run(run: &RunConfig, split: &Split, config: &ExperimentConfig) -> LearnResult<RunReport> {
    let scorer = run.model.scorer();
    info!("== {} / {} ==", scorer.name(), run.update.name());

    let gd = GradientDescent::new(run.descent_config(config.max_ratio, config.max_passes));
    let descent = gd.run(
        vec![0.0; split.training.n_features()],
        &split.training,
        scorer.as_ref(),
    )?;

    let test_rmse = dataset_rmse(
        &descent.weights,
        &split.testing,
        scorer.as_ref(),
        &split.testing.labels(),
    )?;
    info!("testing RMSE: {}", test_rmse);

    let results = score_results(&descent.weights, &split.testing, scorer.as_ref());
    let roc = roc_curve(&results)?;
    let auc = area_under_curve(&roc);
    let operating_point = minimize_error_threshold(&results)?;
    let confusion = confusion_metrics(&apply_threshold(operating_point, &results))?;
    info!(
        "AUC {}; operating point {} with error rate {}",
        auc, operating_point, confusion.error_rate
    );

    Ok(RunReport {
        model: scorer.name().to_string(),
        optimizer: run.update.name().to_string(),
        rate_label: run.rate_label(),
        descent,
        test_rmse,
        roc,
        auc,
        operating_point,
        confusion,
    })
}

/// Prepare `data` once and evaluate every configured run on the same split.
pub fn run_all(data: Dataset, config: &ExperimentConfig) -> LearnResult<Vec<RunReport>> {
    let split = prepare(data, config)?;
    config.runs.iter().map(|r| run(r, &split, config)).collect()
}
