//! Scalar statistics over plain `f64` sequences.
//!
//! Everything here is stateless. Functions that can hit a domain violation
//! (empty input, mismatched lengths, zero spread) return a [`LearnResult`];
//! the two hot-loop helpers, [`dot_product`] and [`logistic`], are total.

use crate::error::{LearnError, LearnResult};

fn check_lengths(a: &[f64], b: &[f64]) -> LearnResult<()> {
    if a.len() != b.len() {
        return Err(LearnError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }
    Ok(())
}

/// Arithmetic mean.
pub fn mean(values: &[f64]) -> LearnResult<f64> {
    if values.is_empty() {
        return Err(LearnError::EmptyInput("mean of an empty sequence"));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Unbiased sample variance (Bessel-corrected, divides by `n - 1`).
pub fn variance(values: &[f64]) -> LearnResult<f64> {
    if values.len() < 2 {
        return Err(LearnError::InsufficientData {
            needed: 2,
            got: values.len(),
        });
    }
    let mu = mean(values)?;
    let ss: f64 = values.iter().map(|&v| (v - mu) * (v - mu)).sum();
    Ok(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn stddev(values: &[f64]) -> LearnResult<f64> {
    Ok(variance(values)?.sqrt())
}

/// Standard scores `(x - mean) / stddev` using the sample's own moments.
pub fn zscore(values: &[f64]) -> LearnResult<Vec<f64>> {
    let mu = mean(values)?;
    let sd = stddev(values)?;
    zscore_with(values, mu, sd)
}

/// Standard scores against a precomputed mean and standard deviation.
pub fn zscore_with(values: &[f64], mu: f64, sd: f64) -> LearnResult<Vec<f64>> {
    if sd == 0.0 {
        return Err(LearnError::ZeroVariance);
    }
    Ok(values.iter().map(|&v| (v - mu) / sd).collect())
}

/// Pairwise product sum. Both slices must have the same length.
#[inline]
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dot product length mismatch");
    a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
}

/// Logistic sigmoid `1 / (1 + e^-x)`, mapping 0 to 1/2.
#[inline]
pub fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sum of squared differences.
pub fn sum_squared_error(predicted: &[f64], actual: &[f64]) -> LearnResult<f64> {
    check_lengths(predicted, actual)?;
    Ok(predicted
        .iter()
        .zip(actual.iter())
        .map(|(&p, &a)| (p - a) * (p - a))
        .sum())
}

/// Root mean squared error.
///
/// A non-finite result is returned as-is; callers that care about
/// overflow (the descent loop does) check `is_finite` themselves.
pub fn root_mean_squared_error(predicted: &[f64], actual: &[f64]) -> LearnResult<f64> {
    if predicted.is_empty() {
        return Err(LearnError::EmptyInput("RMSE of an empty sequence"));
    }
    let sse = sum_squared_error(predicted, actual)?;
    Ok((sse / predicted.len() as f64).sqrt())
}
