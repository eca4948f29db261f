use gradlearn_core::{LearnError, LearnResult};
use log::debug;
use serde::Serialize;

/// Step used by [`minimize_error_threshold`].
pub const THRESHOLD_STEP: f64 = 0.1;

/// A model's score for one held-out example.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredResult {
    /// True label, `0` or `1`.
    pub label: f64,
    pub score: f64,
    /// `Some(true)` for a positive (1) prediction once a threshold is applied.
    pub prediction: Option<bool>,
}

impl ScoredResult {
    pub fn new(label: f64, score: f64) -> Self {
        ScoredResult {
            label,
            score,
            prediction: None,
        }
    }

    pub fn with_prediction(label: f64, score: f64, prediction: bool) -> Self {
        ScoredResult {
            label,
            score,
            prediction: Some(prediction),
        }
    }
}

/// Classify a label as positive (`true`) or negative.
pub(crate) fn is_positive(index: usize, label: f64) -> LearnResult<bool> {
    if label == 1.0 {
        Ok(true)
    } else if label == 0.0 {
        Ok(false)
    } else {
        Err(LearnError::InvalidLabel {
            index,
            label,
            expected: "binary labels must be 0 or 1",
        })
    }
}

/// Predict positive iff `score > threshold`. Returns new results.
pub fn apply_threshold(threshold: f64, results: &[ScoredResult]) -> Vec<ScoredResult> {
    results
        .iter()
        .map(|r| ScoredResult::with_prediction(r.label, r.score, r.score > threshold))
        .collect()
}

/// Confusion-matrix cells and the rates derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fn_: usize,
    pub fp: usize,
    pub tn: usize,
    /// False alarms: `fp / (fp + tn)`.
    pub fpr: f64,
    /// Misses: `fn / (tp + fn)`.
    pub fnr: f64,
    /// Detections: `tp / (tp + fn)`.
    pub tpr: f64,
    /// Overall error rate: `(fp + fn) / total`.
    pub error_rate: f64,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.tp + self.fn_ + self.fp + self.tn
    }
}

/// Count thresholded results into the four confusion cells.
///
/// Every result needs a prediction. A set without positives or without
/// negatives fails with [`LearnError::DegenerateDataset`], since half of
/// the rates would divide by zero.
pub fn confusion_metrics(results: &[ScoredResult]) -> LearnResult<ConfusionCounts> {
    if results.is_empty() {
        return Err(LearnError::EmptyInput("confusion metrics of no results"));
    }

    let (mut tp, mut fn_, mut fp, mut tn) = (0usize, 0usize, 0usize, 0usize);
    for (i, r) in results.iter().enumerate() {
        let predicted = r.prediction.ok_or(LearnError::MissingPrediction(i))?;
        match (is_positive(i, r.label)?, predicted) {
            (true, true) => tp += 1,
            (true, false) => fn_ += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
        }
    }

    if tp + fn_ == 0 {
        return Err(LearnError::DegenerateDataset(
            "no positive examples; true- and false-negative rates are undefined".into(),
        ));
    }
    if fp + tn == 0 {
        return Err(LearnError::DegenerateDataset(
            "no negative examples; false-positive rate is undefined".into(),
        ));
    }

    let positives = (tp + fn_) as f64;
    let negatives = (fp + tn) as f64;
    Ok(ConfusionCounts {
        tp,
        fn_,
        fp,
        tn,
        fpr: fp as f64 / negatives,
        fnr: fn_ as f64 / positives,
        tpr: tp as f64 / positives,
        error_rate: (fp + fn_) as f64 / results.len() as f64,
    })
}

/// Hill-climb for a threshold with low overall error, in steps of 0.1.
///
/// See [`minimize_error_threshold_with_step`].
pub fn minimize_error_threshold(results: &[ScoredResult]) -> LearnResult<f64> {
    minimize_error_threshold_with_step(results, THRESHOLD_STEP)
}

/// Hill-climb for a threshold with low overall error.
///
/// Starts at 0.0 and walks up when the false-positive rate exceeds the
/// false-negative rate, down otherwise. Returns the last threshold before
/// the error rate first rises. This is a local heuristic; the result
/// depends on `step` and need not be the global minimum.
///
/// Once the walk leaves the range of scores no later step can change a
/// prediction, so the current threshold is returned there as well.
pub fn minimize_error_threshold_with_step(results: &[ScoredResult], step: f64) -> LearnResult<f64> {
    if !(step > 0.0 && step.is_finite()) {
        return Err(LearnError::InvalidParameter(format!(
            "threshold step must be positive and finite, got {}",
            step
        )));
    }

    let start = confusion_metrics(&apply_threshold(0.0, results))?;
    let direction = if start.fpr > start.fnr { step } else { -step };
    let lowest = results.iter().map(|r| r.score).fold(f64::INFINITY, f64::min);
    let highest = results.iter().map(|r| r.score).fold(f64::NEG_INFINITY, f64::max);

    let mut threshold = 0.0;
    let mut previous = start.error_rate;
    loop {
        let exhausted = if direction > 0.0 {
            threshold >= highest
        } else {
            threshold < lowest
        };
        if exhausted {
            debug!("threshold walk left the score range at {}", threshold);
            return Ok(threshold);
        }

        let next = threshold + direction;
        let metrics = confusion_metrics(&apply_threshold(next, results))?;
        if metrics.error_rate > previous {
            debug!("operating point {} with error rate {}", threshold, previous);
            return Ok(threshold);
        }
        previous = metrics.error_rate;
        threshold = next;
    }
}
