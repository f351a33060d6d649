//! Optimizers.
//!
//! Optimizers are functional: [`OptimizerConfig::init`] creates an [`OptState`]
//! and [`OptimizerConfig::step`] maps parameters, gradients and the optimizer
//! state to their updated values without touching the inputs.
use crate::util::NamedTensors;
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::ParamsAdamW;
use serde::{Deserialize, Serialize};

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        /// Learning rate.
        lr: f64,
        /// Decay rate of the first moment.
        #[serde(default = "default_beta1")]
        beta1: f64,
        /// Decay rate of the second moment.
        #[serde(default = "default_beta2")]
        beta2: f64,
        /// Term added to the denominator.
        #[serde(default = "default_eps")]
        eps: f64,
        /// Decoupled weight decay.
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// Plain stochastic gradient descent.
    Sgd {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 1e-3 }
    }
}

/// State of an optimizer.
#[derive(Clone, Debug)]
pub struct OptState {
    /// Number of applied steps.
    pub step: u64,

    /// First moments, empty for [`OptimizerConfig::Sgd`].
    pub m: NamedTensors,

    /// Second moments, empty for [`OptimizerConfig::Sgd`].
    pub v: NamedTensors,
}

// (lr, beta1, beta2, eps, weight_decay)
type AdamParams = (f64, f64, f64, f64, f64);

impl OptimizerConfig {
    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
            Self::Sgd { lr: _ } => Self::Sgd { lr },
        }
    }

    /// Learning rate.
    pub fn get_learning_rate(&self) -> f64 {
        match self {
            Self::AdamW { lr, .. } | Self::Adam { lr } | Self::Sgd { lr } => *lr,
        }
    }

    fn adam_params(&self) -> Option<AdamParams> {
        let d = ParamsAdamW::default();
        match self {
            Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Some((*lr, *beta1, *beta2, *eps, *weight_decay)),
            Self::Adam { lr } => Some((*lr, d.beta1, d.beta2, d.eps, 0.0)),
            Self::Sgd { .. } => None,
        }
    }

    /// Creates the state of the optimizer for `params`.
    pub fn init(&self, params: &NamedTensors) -> Result<OptState> {
        let (m, v) = match self.adam_params() {
            Some(_) => (params.zeros_like()?, params.zeros_like()?),
            None => (NamedTensors::new(), NamedTensors::new()),
        };
        Ok(OptState { step: 0, m, v })
    }

    /// Applies one step, returning the updated parameters and optimizer state.
    pub fn step(
        &self,
        params: &NamedTensors,
        grads: &NamedTensors,
        opt_state: &OptState,
    ) -> Result<(NamedTensors, OptState)> {
        let step = opt_state.step + 1;

        match self.adam_params() {
            None => {
                let lr = self.get_learning_rate();
                let params = params.zip_map(grads, |p, g| Ok((p - g.affine(lr, 0.0)?)?))?;
                let opt_state = OptState {
                    step,
                    m: opt_state.m.clone(),
                    v: opt_state.v.clone(),
                };
                Ok((params, opt_state))
            }
            Some((lr, beta1, beta2, eps, weight_decay)) => {
                let m = opt_state
                    .m
                    .zip_map(grads, |m, g| Ok((m.affine(beta1, 0.0)? + g.affine(1.0 - beta1, 0.0)?)?))?;
                let v = opt_state
                    .v
                    .zip_map(grads, |v, g| Ok((v.affine(beta2, 0.0)? + g.sqr()?.affine(1.0 - beta2, 0.0)?)?))?;
                let bias1 = 1.0 - beta1.powi(step as i32);
                let bias2 = 1.0 - beta2.powi(step as i32);

                let mut updated = Vec::with_capacity(params.len());
                for (name, p) in params.iter() {
                    let m_hat = m.get(name)?.affine(1.0 / bias1, 0.0)?;
                    let v_hat = v.get(name)?.affine(1.0 / bias2, 0.0)?;
                    let delta = (m_hat / (v_hat.sqrt()? + eps)?)?;
                    let p = p.affine(1.0 - lr * weight_decay, 0.0)?;
                    updated.push((name.clone(), (p - delta.affine(lr, 0.0)?)?));
                }

                Ok((updated.into_iter().collect(), OptState { step, m, v }))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::Device;

    fn params() -> Result<NamedTensors> {
        Ok(NamedTensors::new().with("w", Tensor::new(&[1f32, -2.0], &Device::Cpu)?))
    }

    fn grads() -> Result<NamedTensors> {
        Ok(NamedTensors::new().with("w", Tensor::new(&[0.5f32, -0.5], &Device::Cpu)?))
    }

    #[test]
    fn test_sgd_step() -> Result<()> {
        let opt = OptimizerConfig::Sgd { lr: 0.1 };
        let state = opt.init(&params()?)?;
        let (p, state) = opt.step(&params()?, &grads()?, &state)?;
        assert_eq!(state.step, 1);
        let w = p.get("w")?.to_vec1::<f32>()?;
        assert!((w[0] - 0.95).abs() < 1e-6);
        assert!((w[1] + 1.95).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() -> Result<()> {
        // With bias correction the first Adam step is lr * sign(g) up to eps.
        let opt = OptimizerConfig::Adam { lr: 1e-2 };
        let p0 = params()?;
        let state = opt.init(&p0)?;
        let (p1, state) = opt.step(&p0, &grads()?, &state)?;
        assert_eq!(state.step, 1);
        let w = p1.get("w")?.to_vec1::<f32>()?;
        assert!((w[0] - 0.99).abs() < 1e-5);
        assert!((w[1] + 1.99).abs() < 1e-5);

        // The inputs are untouched.
        assert_eq!(p0.get("w")?.to_vec1::<f32>()?, vec![1.0, -2.0]);
        Ok(())
    }

    #[test]
    fn test_serde_default() -> Result<()> {
        let opt: OptimizerConfig = serde_yaml::from_str("AdamW:\n  lr: 0.001\n")?;
        match opt {
            OptimizerConfig::AdamW { lr, beta1, .. } => {
                assert_eq!(lr, 0.001);
                assert_eq!(beta1, ParamsAdamW::default().beta1);
            }
            _ => panic!(),
        }
        assert_eq!(OptimizerConfig::default().learning_rate(0.5).get_learning_rate(), 0.5);
        Ok(())
    }
}
