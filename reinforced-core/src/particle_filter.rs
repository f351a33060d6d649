//! Sequential Monte Carlo estimation of a latent scalar.
//!
//! A population of `N` particles approximates the posterior of a latent value.
//! Each update moves the particles with a Brownian random walk and reweights
//! them by the likelihood of the new observation. Weights are kept as
//! un-normalized logarithms and shifted by their maximum after every update;
//! the shift leaves the represented distribution unchanged and only bounds the
//! numerical range. No resampling is performed.
use crate::{
    error::RlError,
    util::{categorical, nanmax, softmax},
    PrngKey,
};
use anyhow::Result;
use log::warn;
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Normal, StandardNormal, Uniform};
use serde::{Deserialize, Serialize};

/// State of a [`ParticleFilter`].
///
/// `positions[i]` and `logit_weights[i]` describe the same particle.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ParticleFilterState {
    /// Values of the particles.
    pub positions: Array1<f64>,

    /// Un-normalized log-weights of the particles.
    pub logit_weights: Array1<f64>,
}

impl ParticleFilterState {
    /// Number of particles.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if there is no particle.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Normalized weights, `softmax(logit_weights)`.
    pub fn probabilities(&self) -> Vec<f64> {
        softmax(&self.logit_weights.to_vec())
    }

    /// Posterior mean of the latent value.
    pub fn mean(&self) -> f64 {
        self.probabilities()
            .iter()
            .zip(self.positions.iter())
            .map(|(p, x)| p * x)
            .sum()
    }

    /// Kish's effective sample size, `1 / sum(p_i^2)`.
    ///
    /// Drops towards 1 as the weights collapse onto a few particles.
    pub fn effective_sample_size(&self) -> f64 {
        1.0 / self.probabilities().iter().map(|p| p * p).sum::<f64>()
    }
}

/// Distribution of the particles created by [`ParticleFilter::init`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum InitialDistribution {
    /// Uniform on `[low, high)`.
    Uniform {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },

    /// Gaussian.
    Normal {
        /// Mean.
        mean: f64,
        /// Standard deviation.
        std: f64,
    },
}

impl InitialDistribution {
    fn validate(&self) -> Result<()> {
        match self {
            Self::Uniform { low, high } => {
                if !(high - low).is_finite() {
                    return Err(RlError::invalid_parameter(
                        "initial_distribution",
                        format!("uniform bounds must be finite, got [{}, {})", low, high),
                    )
                    .into());
                }
                if !(low < high) {
                    return Err(RlError::invalid_parameter(
                        "initial_distribution",
                        format!("uniform bounds must satisfy low < high, got [{}, {})", low, high),
                    )
                    .into());
                }
            }
            Self::Normal { mean, std } => {
                if !mean.is_finite() {
                    return Err(RlError::invalid_parameter(
                        "initial_distribution",
                        format!("mean must be finite, got {}", mean),
                    )
                    .into());
                }
                if !(*std > 0.0 && std.is_finite()) {
                    return Err(RlError::invalid_parameter(
                        "initial_distribution",
                        format!("standard deviation must be positive and finite, got {}", std),
                    )
                    .into());
                }
            }
        }
        Ok(())
    }

    fn draw(&self, key: PrngKey, n: usize) -> Result<Array1<f64>> {
        let mut rng = key.rng();
        let xs = match self {
            Self::Uniform { low, high } => {
                let dist = Uniform::new(*low, *high);
                (0..n).map(|_| rng.sample(dist)).collect::<Vec<f64>>()
            }
            Self::Normal { mean, std } => {
                let dist = Normal::new(*mean, *std)?;
                (0..n).map(|_| rng.sample(dist)).collect::<Vec<f64>>()
            }
        };
        Ok(Array1::from(xs))
    }
}

/// Likelihood of an observation given the latent value of one particle.
pub trait ObservationModel {
    /// Observation consumed by the model.
    type Observation;

    /// Log-likelihood increment added to the log-weight of a particle at `position`.
    fn log_likelihood(&self, position: f64, obs: &Self::Observation) -> f64;
}

/// Particle filter over a scalar latent value.
#[derive(Clone, Debug)]
pub struct ParticleFilter<M> {
    n_particles: usize,
    initial_distribution: InitialDistribution,
    model: M,
}

impl<M: ObservationModel> ParticleFilter<M> {
    /// Creates a filter with `n_particles` particles.
    pub fn new(n_particles: usize, initial_distribution: InitialDistribution, model: M) -> Result<Self> {
        if n_particles == 0 {
            return Err(RlError::invalid_parameter("particles_num", "must be positive").into());
        }
        initial_distribution.validate()?;

        Ok(Self {
            n_particles,
            initial_distribution,
            model,
        })
    }

    /// Number of particles.
    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    /// The observation model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Draws the particles from the initial distribution with uniform weights.
    pub fn init(&self, key: PrngKey) -> Result<ParticleFilterState> {
        Ok(ParticleFilterState {
            positions: self.initial_distribution.draw(key, self.n_particles)?,
            logit_weights: Array1::zeros(self.n_particles),
        })
    }

    /// Moves every particle by Gaussian noise with standard deviation `scale * sqrt(delta_time)`.
    pub fn transition(
        &self,
        state: &ParticleFilterState,
        key: PrngKey,
        delta_time: f64,
        scale: f64,
    ) -> ParticleFilterState {
        let mut rng = key.rng();
        let std = scale * delta_time.sqrt();
        let positions = state
            .positions
            .mapv(|x| x + std * rng.sample::<f64, _>(StandardNormal));

        ParticleFilterState {
            positions,
            logit_weights: state.logit_weights.clone(),
        }
    }

    /// Adds the log-likelihood of `obs` to every log-weight and shifts them by their maximum.
    ///
    /// An observation impossible under every particle leaves the weights unchanged.
    pub fn reweight(&self, state: &ParticleFilterState, obs: &M::Observation) -> ParticleFilterState {
        let logit_weights = state
            .logit_weights
            .iter()
            .zip(state.positions.iter())
            .map(|(&w, &x)| w + self.model.log_likelihood(x, obs))
            .collect::<Array1<f64>>();
        let max = nanmax(logit_weights.iter().cloned());
        if !max.is_finite() {
            warn!("Observation has zero likelihood under every particle, weights are kept");
            return state.clone();
        }

        ParticleFilterState {
            positions: state.positions.clone(),
            logit_weights: logit_weights - max,
        }
    }

    /// One filtering step: [`ParticleFilter::transition`] then [`ParticleFilter::reweight`].
    pub fn update(
        &self,
        state: &ParticleFilterState,
        key: PrngKey,
        obs: &M::Observation,
        delta_time: f64,
        scale: f64,
    ) -> ParticleFilterState {
        let state = self.transition(state, key, delta_time, scale);
        self.reweight(&state, obs)
    }

    /// Draws the position of one particle with probability `softmax(logit_weights)`.
    pub fn sample(&self, state: &ParticleFilterState, key: PrngKey) -> Result<f64> {
        let ix = categorical(key, &state.probabilities())?;
        Ok(state.positions[ix])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // Observing `true` favours positive positions.
    struct SignModel;

    impl ObservationModel for SignModel {
        type Observation = bool;

        fn log_likelihood(&self, position: f64, obs: &bool) -> f64 {
            let p = 1.0 / (1.0 + (-position).exp());
            if *obs {
                p.ln()
            } else {
                (1.0 - p).ln()
            }
        }
    }

    fn filter(n: usize) -> ParticleFilter<SignModel> {
        ParticleFilter::new(
            n,
            InitialDistribution::Uniform {
                low: -5.0,
                high: 5.0,
            },
            SignModel,
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_parameters() {
        let uniform = InitialDistribution::Uniform { low: 0.0, high: 1.0 };
        assert!(ParticleFilter::new(0, uniform, SignModel).is_err());
        let empty = InitialDistribution::Uniform { low: 1.0, high: 1.0 };
        assert!(ParticleFilter::new(10, empty, SignModel).is_err());
        let normal = InitialDistribution::Normal { mean: 0.0, std: 0.0 };
        assert!(ParticleFilter::new(10, normal, SignModel).is_err());

        let unbounded = [
            InitialDistribution::Uniform { low: f64::NEG_INFINITY, high: 0.0 },
            InitialDistribution::Uniform { low: 0.0, high: f64::INFINITY },
            InitialDistribution::Uniform { low: -f64::MAX, high: f64::MAX },
            InitialDistribution::Normal { mean: f64::NAN, std: 1.0 },
            InitialDistribution::Normal { mean: 0.0, std: f64::INFINITY },
        ];
        for dist in unbounded.iter() {
            match ParticleFilter::new(10, dist.clone(), SignModel) {
                Err(e) => match e.downcast_ref::<RlError>() {
                    Some(RlError::InvalidParameter { name, .. }) => assert_eq!(name, "initial_distribution"),
                    e => panic!("unexpected error: {:?}", e),
                },
                Ok(_) => panic!("{:?} should be rejected", dist),
            }
        }
    }

    #[test]
    fn test_init() {
        let pf = filter(500);
        let state = pf.init(PrngKey::new(0)).unwrap();
        assert_eq!(state.positions.len(), 500);
        assert_eq!(state.logit_weights.len(), 500);
        assert!(state.positions.iter().all(|&x| (-5.0..5.0).contains(&x)));
        assert!(state.logit_weights.iter().all(|&w| w == 0.0));
        assert!((state.effective_sample_size() - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_update_keeps_lengths_and_renormalizes() {
        let pf = filter(200);
        let mut state = pf.init(PrngKey::new(1)).unwrap();
        for (t, key) in PrngKey::new(2).split_n(20).into_iter().enumerate() {
            state = pf.update(&state, key, &(t % 3 != 0), 0.01, 1.0);
            assert_eq!(state.positions.len(), 200);
            assert_eq!(state.logit_weights.len(), 200);
            assert_eq!(nanmax(state.logit_weights.iter().cloned()), 0.0);
        }
    }

    #[test]
    fn test_renormalization_does_not_change_probabilities() {
        let pf = filter(100);
        let state = pf.init(PrngKey::new(3)).unwrap();
        let state = pf.reweight(&state, &true);
        let shifted = ParticleFilterState {
            positions: state.positions.clone(),
            logit_weights: &state.logit_weights - 17.5,
        };
        for (p, q) in state.probabilities().iter().zip(shifted.probabilities().iter()) {
            assert!((p - q).abs() < 1e-12);
        }
    }

    #[test]
    fn test_posterior_moves_towards_evidence() {
        let pf = filter(1000);
        let mut state = pf.init(PrngKey::new(4)).unwrap();
        let prior_mean = state.mean();
        for _ in 0..10 {
            state = pf.reweight(&state, &true);
        }
        assert!(state.mean() > prior_mean + 1.0);
        assert!(state.effective_sample_size() < 1000.0);
    }

    #[test]
    fn test_transition_spread_grows_with_time() {
        let pf = filter(2000);
        let state = ParticleFilterState {
            positions: Array1::zeros(2000),
            logit_weights: Array1::zeros(2000),
        };
        let var = |s: &ParticleFilterState| s.positions.mapv(|x| x * x).mean().unwrap();
        let short = pf.transition(&state, PrngKey::new(5), 0.01, 2.0);
        let long = pf.transition(&state, PrngKey::new(5), 1.0, 2.0);
        // Expected variances are 0.04 and 4.0.
        assert!((var(&short) - 0.04).abs() < 0.01);
        assert!((var(&long) - 4.0).abs() < 0.5);
    }

    #[test]
    fn test_impossible_observation_keeps_weights() {
        struct Never;
        impl ObservationModel for Never {
            type Observation = ();
            fn log_likelihood(&self, _: f64, _: &()) -> f64 {
                f64::NEG_INFINITY
            }
        }

        let pf = ParticleFilter::new(10, InitialDistribution::Normal { mean: 0.0, std: 1.0 }, Never).unwrap();
        let state = pf.init(PrngKey::new(8)).unwrap();
        assert_eq!(pf.reweight(&state, &()), state);
    }

    #[test]
    fn test_sample_is_deterministic() {
        let pf = filter(100);
        let state = pf.init(PrngKey::new(6)).unwrap();
        let state = pf.reweight(&state, &false);
        let key = PrngKey::new(7);
        assert_eq!(pf.sample(&state, key).unwrap(), pf.sample(&state, key).unwrap());
    }
}
