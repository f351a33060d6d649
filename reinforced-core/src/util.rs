//! Numerical helpers shared by agents.
use crate::PrngKey;
use anyhow::Result;
use rand::{distributions::WeightedIndex, prelude::Distribution};

/// Softmax of `logits`, shifted by their maximum for numerical stability.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps = logits.iter().map(|&l| (l - max).exp()).collect::<Vec<_>>();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Maximum of `xs` ignoring NaN values; `-inf` if every value is NaN.
pub fn nanmax(xs: impl IntoIterator<Item = f64>) -> f64 {
    xs.into_iter()
        .filter(|x| !x.is_nan())
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Index of the first maximum of `xs`.
pub fn argmax(xs: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate() {
        if x > xs[best] {
            best = i;
        }
    }
    best
}

/// Draws one index from the categorical distribution with the given probabilities.
///
/// The probabilities need not be normalized.
pub fn categorical(key: PrngKey, probs: &[f64]) -> Result<usize> {
    let dist = WeightedIndex::new(probs)?;
    Ok(dist.sample(&mut key.rng()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_softmax_shift_invariance() {
        let logits = [0.5, -1.0, 2.0, 0.0];
        let shifted = logits.iter().map(|l| l - 123.4).collect::<Vec<_>>();
        let p1 = softmax(&logits);
        let p2 = softmax(&shifted);
        assert!((p1.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for (a, b) in p1.iter().zip(p2.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_large_logits() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_argmax_and_nanmax() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), 1);
        assert_eq!(nanmax(vec![1.0, f64::NAN, -2.0]), 1.0);
        assert_eq!(nanmax(vec![f64::NAN]), f64::NEG_INFINITY);
    }

    #[test]
    fn test_categorical_degenerate() {
        for seed in 0..20 {
            assert_eq!(categorical(PrngKey::new(seed), &[0.0, 0.0, 1.0]).unwrap(), 2);
        }
        assert!(categorical(PrngKey::new(0), &[0.0, 0.0]).is_err());
    }
}
