use gradlearn_core::{LearnError, LearnResult};
use serde::Serialize;

use crate::classification::{apply_threshold, confusion_metrics, is_positive, ScoredResult};

/// One operating point on a ROC curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
}

impl RocPoint {
    pub fn new(fpr: f64, tpr: f64) -> Self {
        RocPoint { fpr, tpr }
    }
}

/// The ROC point of a single threshold.
pub fn roc_point(threshold: f64, results: &[ScoredResult]) -> LearnResult<RocPoint> {
    let cm = confusion_metrics(&apply_threshold(threshold, results))?;
    Ok(RocPoint::new(cm.fpr, cm.tpr))
}

/// ROC curve across every result's score.
///
/// The first point uses a threshold below the lowest score, so it is (1, 1).
/// Then each result's score is used as the threshold in ascending order.
/// Tied scores each contribute a point. The curve ends at (0, 0), where
/// nothing scores above the highest threshold.
pub fn roc_curve(results: &[ScoredResult]) -> LearnResult<Vec<RocPoint>> {
    if results.is_empty() {
        return Err(LearnError::EmptyInput("ROC curve of no results"));
    }

    let mut sorted = Vec::with_capacity(results.len());
    for (i, r) in results.iter().enumerate() {
        if r.score.is_nan() {
            return Err(LearnError::InvalidParameter(format!("score at index {} is NaN", i)));
        }
        sorted.push((r.score, is_positive(i, r.label)?));
    }
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = sorted.len();
    let total_pos = sorted.iter().filter(|(_, pos)| *pos).count();
    let total_neg = n - total_pos;
    if total_pos == 0 || total_neg == 0 {
        return Err(LearnError::DegenerateDataset(
            "ROC needs both positive and negative examples".into(),
        ));
    }

    // pos_from[i] / neg_from[i]: positives / negatives among sorted[i..]
    let mut pos_from = vec![0usize; n + 1];
    let mut neg_from = vec![0usize; n + 1];
    for i in (0..n).rev() {
        let pos = sorted[i].1 as usize;
        pos_from[i] = pos_from[i + 1] + pos;
        neg_from[i] = neg_from[i + 1] + (1 - pos);
    }
    let point_at = |start: usize| {
        RocPoint::new(
            neg_from[start] as f64 / total_neg as f64,
            pos_from[start] as f64 / total_pos as f64,
        )
    };

    let mut points = Vec::with_capacity(n + 1);
    points.push(point_at(0));

    let mut i = 0;
    while i < n {
        // results tied with sorted[i] are not above it
        let mut end = i + 1;
        while end < n && sorted[end].0 == sorted[i].0 {
            end += 1;
        }
        let point = point_at(end);
        points.extend(std::iter::repeat(point).take(end - i));
        i = end;
    }

    Ok(points)
}

/// Trapezoidal area under a curve in [`roc_curve`] order (descending FPR).
pub fn area_under_curve(points: &[RocPoint]) -> f64 {
    let ascending: Vec<&RocPoint> = points.iter().rev().collect();
    let area: f64 = ascending
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[1].tpr + w[0].tpr))
        .sum();
    0.5 * area
}
