//! Exploration strategies.
//!
//! Explorers turn the action values of one state into a probability vector
//! over actions. The action is then drawn with a single categorical draw.
use anyhow::Result;
use reinforced_core::{error::RlError, util::softmax};
use serde::{Deserialize, Serialize};

/// Softmax action selection with temperature `tau`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub struct Softmax {
    /// Temperature.
    pub tau: f64,
}

impl Softmax {
    /// Constructs softmax explorer.
    pub fn new(tau: f64) -> Result<Self> {
        if !(tau > 0.0) {
            return Err(RlError::invalid_parameter("tau", format!("must be positive, got {}", tau)).into());
        }
        Ok(Self { tau })
    }

    /// `softmax(q / tau)`.
    pub fn probs(&self, q: &[f32]) -> Vec<f64> {
        let logits = q.iter().map(|&x| x as f64 / self.tau).collect::<Vec<_>>();
        softmax(&logits)
    }
}

/// Epsilon-greedy action selection with multiplicative decay of epsilon.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub struct EpsilonGreedy {
    /// Initial epsilon.
    pub epsilon: f64,

    /// Factor applied to epsilon after every update.
    pub epsilon_decay: f64,

    /// Lower bound of epsilon.
    pub epsilon_min: f64,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            epsilon_decay: 0.999,
            epsilon_min: 0.001,
        }
    }
}

impl EpsilonGreedy {
    /// Set the initial epsilon.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Set the decay factor.
    pub fn epsilon_decay(mut self, v: f64) -> Self {
        self.epsilon_decay = v;
        self
    }

    /// Set the lower bound of epsilon.
    pub fn epsilon_min(mut self, v: f64) -> Self {
        self.epsilon_min = v;
        self
    }

    /// Checks `0 <= epsilon <= 1`, `0 <= epsilon_decay <= 1` and `0 <= epsilon_min <= epsilon`.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(RlError::invalid_parameter("epsilon", format!("must be in [0, 1], got {}", self.epsilon)).into());
        }
        if !(0.0..=1.0).contains(&self.epsilon_decay) {
            return Err(RlError::invalid_parameter(
                "epsilon_decay",
                format!("must be in [0, 1], got {}", self.epsilon_decay),
            )
            .into());
        }
        if !(0.0..=self.epsilon).contains(&self.epsilon_min) {
            return Err(RlError::invalid_parameter(
                "epsilon_min",
                format!("must be in [0, epsilon], got {}", self.epsilon_min),
            )
            .into());
        }
        Ok(())
    }

    /// `max(epsilon * epsilon_decay, epsilon_min)`.
    pub fn decay(&self, epsilon: f64) -> f64 {
        (epsilon * self.epsilon_decay).max(self.epsilon_min)
    }

    /// Mixture of the greedy policy and the uniform policy.
    ///
    /// The greedy part is split evenly among all maximizers of `q`, so every
    /// maximizer gets `(1 - epsilon) / n_max + epsilon / n` and every other
    /// action `epsilon / n`.
    pub fn probs(q: &[f32], epsilon: f64) -> Vec<f64> {
        let n = q.len() as f64;
        let max = q.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let mask = q.iter().map(|&x| (x == max) as u8 as f64).collect::<Vec<_>>();
        let n_max: f64 = mask.iter().sum();

        mask.into_iter()
            .map(|m| (1.0 - epsilon) * m / n_max + epsilon / n)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_epsilon_greedy_mixture() {
        let probs = EpsilonGreedy::probs(&[0.1, 2.0, -1.0, 0.5], 0.3);
        assert!((probs[1] - 0.775).abs() < 1e-12);
        for i in [0, 2, 3] {
            assert!((probs[i] - 0.075).abs() < 1e-12);
        }
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_epsilon_greedy_ties() {
        let probs = EpsilonGreedy::probs(&[1.0, 1.0, 0.0, 0.0], 0.2);
        assert!((probs[0] - 0.45).abs() < 1e-12);
        assert!((probs[1] - 0.45).abs() < 1e-12);
        assert!((probs[2] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_epsilon_bounds() {
        let explorer = EpsilonGreedy::default().epsilon(0.5).epsilon_decay(0.9).epsilon_min(0.1);
        explorer.validate().unwrap();
        let mut eps = explorer.epsilon;
        for _ in 0..100 {
            let next = explorer.decay(eps);
            assert!(next <= eps);
            assert!(next >= explorer.epsilon_min);
            eps = next;
        }
        assert_eq!(eps, 0.1);
    }

    #[test]
    fn test_invalid_epsilon() {
        assert!(EpsilonGreedy::default().epsilon(1.5).validate().is_err());
        assert!(EpsilonGreedy::default().epsilon_decay(-0.1).validate().is_err());
        assert!(EpsilonGreedy::default().epsilon(0.1).epsilon_min(0.2).validate().is_err());
    }

    #[test]
    fn test_softmax_probs() {
        assert!(Softmax::new(0.0).is_err());
        let probs = Softmax::new(1.0).unwrap().probs(&[0.0, 0.0]);
        assert_eq!(probs, vec![0.5, 0.5]);
        let sharp = Softmax::new(0.01).unwrap().probs(&[0.0, 1.0]);
        assert!(sharp[1] > 0.999);
    }
}
