use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::dataset::{Dataset, LabeledExample};

/// Generate two uniform blobs labeled `0` and `1`.
///
/// Class 0 is centered at the origin and class 1 at `separation` along
/// every axis; each coordinate gets uniform noise in `[-1, 1)`. Half the
/// samples (rounded down) are positive, in shuffled order.
pub fn make_binary_blobs(
    n_samples: usize,
    n_features: usize,
    separation: f64,
    seed: Option<u64>,
) -> Dataset {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut examples: Vec<LabeledExample> = (0..n_samples)
        .map(|i| {
            let label = (i % 2) as f64;
            let center = label * separation;
            let features = (0..n_features)
                .map(|_| center + rng.gen_range(-1.0..1.0))
                .collect();
            LabeledExample::new(features, label)
        })
        .collect();
    examples.shuffle(&mut rng);

    Dataset {
        examples,
        n_features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_binary_blobs() {
        let data = make_binary_blobs(40, 3, 5.0, Some(7));
        assert_eq!(data.len(), 40);
        assert_eq!(data.n_features(), 3);
        let positives = data.iter().filter(|e| e.label == 1.0).count();
        assert_eq!(positives, 20);
        for ex in &data {
            let lo = ex.label * 5.0 - 1.0;
            let hi = ex.label * 5.0 + 1.0;
            assert!(ex.features.iter().all(|&f| f >= lo && f < hi));
        }
        assert_eq!(data, make_binary_blobs(40, 3, 5.0, Some(7)));
    }
}
