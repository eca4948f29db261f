use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{LearnError, LearnResult};
use crate::stats;

/// A single feature vector together with its true label.
///
/// Labels are `0`/`1` for regression and `-1`/`+1` for the perceptron.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledExample {
    pub features: Vec<f64>,
    pub label: f64,
}

impl LabeledExample {
    pub fn new(features: Vec<f64>, label: f64) -> Self {
        LabeledExample { features, label }
    }

    /// Replace the feature vector, keeping the label.
    pub fn with_features(self, features: Vec<f64>) -> Self {
        LabeledExample {
            features,
            label: self.label,
        }
    }
}

/// An ordered collection of labeled examples sharing one feature width.
///
/// Transforms consume the dataset and return a new one; nothing is edited
/// in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub(crate) examples: Vec<LabeledExample>,
    pub(crate) n_features: usize,
}

impl Dataset {
    /// Build a dataset, checking every example has the width of the first.
    pub fn new(examples: Vec<LabeledExample>) -> LearnResult<Self> {
        let n_features = examples.first().map_or(0, |e| e.features.len());
        for ex in &examples {
            if ex.features.len() != n_features {
                return Err(LearnError::DimensionMismatch {
                    expected: n_features,
                    got: ex.features.len(),
                });
            }
        }
        Ok(Dataset {
            examples,
            n_features,
        })
    }

    /// Build from parallel rows and labels.
    pub fn from_rows(rows: Vec<Vec<f64>>, labels: Vec<f64>) -> LearnResult<Self> {
        if rows.len() != labels.len() {
            return Err(LearnError::DimensionMismatch {
                expected: rows.len(),
                got: labels.len(),
            });
        }
        let examples = rows
            .into_iter()
            .zip(labels)
            .map(|(features, label)| LabeledExample::new(features, label))
            .collect();
        Dataset::new(examples)
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn examples(&self) -> &[LabeledExample] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledExample> {
        self.examples.iter()
    }

    pub fn labels(&self) -> Vec<f64> {
        self.examples.iter().map(|e| e.label).collect()
    }

    pub fn into_examples(self) -> Vec<LabeledExample> {
        self.examples
    }

    /// Transform every feature column with `kernel`.
    ///
    /// The kernel sees one full column (feature `j` of every example) and
    /// must return a column of the same length.
    pub fn apply_kernel<F>(self, mut kernel: F) -> LearnResult<Self>
    where
        F: FnMut(&[f64]) -> LearnResult<Vec<f64>>,
    {
        let n = self.examples.len();
        let mut columns = Vec::with_capacity(self.n_features);
        for j in 0..self.n_features {
            let column: Vec<f64> = self.examples.iter().map(|e| e.features[j]).collect();
            let transformed = kernel(&column)?;
            if transformed.len() != n {
                return Err(LearnError::DimensionMismatch {
                    expected: n,
                    got: transformed.len(),
                });
            }
            columns.push(transformed);
        }

        let examples = self
            .examples
            .into_iter()
            .enumerate()
            .map(|(i, ex)| {
                let features = columns.iter().map(|col| col[i]).collect();
                ex.with_features(features)
            })
            .collect();

        Ok(Dataset {
            examples,
            n_features: self.n_features,
        })
    }

    /// Standardize each column to zero mean and unit sample deviation.
    pub fn zscore_columns(self) -> LearnResult<Self> {
        self.apply_kernel(stats::zscore)
    }

    /// Prepend the constant 1.0 phantom feature so weight 0 acts as a bias.
    pub fn with_bias(self) -> Self {
        let examples = self
            .examples
            .into_iter()
            .map(|ex| {
                let mut features = Vec::with_capacity(ex.features.len() + 1);
                features.push(1.0);
                features.extend_from_slice(&ex.features);
                ex.with_features(features)
            })
            .collect();
        Dataset {
            examples,
            n_features: self.n_features + 1,
        }
    }

    /// Deal examples into `k` folds: example `i` lands in fold `i % k`.
    pub fn round_robin_folds(&self, k: usize) -> LearnResult<Vec<Dataset>> {
        if k == 0 {
            return Err(LearnError::InvalidParameter("fold count must be positive".into()));
        }
        let mut folds: Vec<Vec<LabeledExample>> = vec![Vec::new(); k];
        for (i, ex) in self.examples.iter().enumerate() {
            folds[i % k].push(ex.clone());
        }
        Ok(folds
            .into_iter()
            .map(|examples| Dataset {
                examples,
                n_features: self.n_features,
            })
            .collect())
    }

    /// Hold out fold `test_fold` of `k` round-robin folds.
    ///
    /// Returns `(training, testing)`; training is the remaining folds
    /// concatenated in fold order.
    pub fn holdout(&self, k: usize, test_fold: usize) -> LearnResult<(Dataset, Dataset)> {
        if test_fold >= k {
            return Err(LearnError::InvalidParameter(format!(
                "test fold {} out of range for {} folds",
                test_fold, k
            )));
        }
        let mut testing = None;
        let mut training = Vec::with_capacity(self.examples.len());
        for (idx, fold) in self.round_robin_folds(k)?.into_iter().enumerate() {
            if idx == test_fold {
                testing = Some(fold);
            } else {
                training.extend(fold.examples);
            }
        }
        let testing = testing.unwrap_or_else(|| Dataset {
            examples: Vec::new(),
            n_features: self.n_features,
        });
        Ok((
            Dataset {
                examples: training,
                n_features: self.n_features,
            },
            testing,
        ))
    }

    /// Deterministically shuffle the examples.
    pub fn shuffled(mut self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        self.examples.shuffle(&mut rng);
        self
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a LabeledExample;
    type IntoIter = std::slice::Iter<'a, LabeledExample>;

    fn into_iter(self) -> Self::IntoIter {
        self.examples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dataset {
        Dataset::from_rows(
            vec![
                vec![1.0, 10.0],
                vec![2.0, 20.0],
                vec![3.0, 30.0],
                vec![4.0, 40.0],
                vec![5.0, 50.0],
            ],
            vec![0.0, 1.0, 0.0, 1.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Dataset::from_rows(vec![vec![1.0, 2.0], vec![1.0]], vec![0.0, 1.0]).unwrap_err();
        assert_eq!(err, LearnError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn test_zscore_columns_keeps_labels() {
        let data = small().zscore_columns().unwrap();
        assert_eq!(data.labels(), vec![0.0, 1.0, 0.0, 1.0, 1.0]);
        for j in 0..2 {
            let col: Vec<f64> = data.iter().map(|e| e.features[j]).collect();
            assert!(stats::mean(&col).unwrap().abs() < 1e-12);
            assert!((stats::stddev(&col).unwrap() - 1.0).abs() < 1e-12);
        }
        // both columns are the same line up to scale, so they standardize identically
        assert!((data.examples()[0].features[0] - data.examples()[0].features[1]).abs() < 1e-12);
    }

    #[test]
    fn test_kernel_width_checked() {
        let err = small().apply_kernel(|col| Ok(col[..2].to_vec())).unwrap_err();
        assert_eq!(err, LearnError::DimensionMismatch { expected: 5, got: 2 });
    }

    #[test]
    fn test_with_bias() {
        let data = small().with_bias();
        assert_eq!(data.n_features(), 3);
        assert!(data.iter().all(|e| e.features[0] == 1.0));
        assert_eq!(data.examples()[1].features, vec![1.0, 2.0, 20.0]);
    }

    #[test]
    fn test_round_robin_holdout() {
        let data = small();
        let folds = data.round_robin_folds(2).unwrap();
        assert_eq!(folds[0].len(), 3);
        assert_eq!(folds[1].len(), 2);

        let (train, test) = data.holdout(2, 0).unwrap();
        let test_first: Vec<f64> = test.iter().map(|e| e.features[0]).collect();
        let train_first: Vec<f64> = train.iter().map(|e| e.features[0]).collect();
        assert_eq!(test_first, vec![1.0, 3.0, 5.0]);
        assert_eq!(train_first, vec![2.0, 4.0]);

        assert!(data.holdout(2, 2).is_err());
        assert!(data.round_robin_folds(0).is_err());
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = small().shuffled(1337);
        let b = small().shuffled(1337);
        assert_eq!(a, b);
        let mut firsts: Vec<f64> = a.iter().map(|e| e.features[0]).collect();
        firsts.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(firsts, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
