//! Configuration of Expected SARSA agent.
use crate::{
    explorer::Softmax,
    opt::OptimizerConfig,
    util::{CriticLoss, OutDim},
    Device,
};
use anyhow::Result;
use log::info;
use reinforced_core::replay_buffer::ReplayBufferConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ExpectedSarsa`](super::ExpectedSarsa).
///
/// `C` is the configuration of the Q-network; its output dimension is the
/// number of actions.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ExpectedSarsaConfig<C> {
    pub(super) model_config: C,
    pub(super) replay_buffer: ReplayBufferConfig,
    pub(super) experience_replay_steps: usize,
    pub(super) discount: f64,
    pub(super) tau: f64,
    pub(super) optimizer: OptimizerConfig,
    #[serde(default)]
    pub(super) critic_loss: CriticLoss,
    #[serde(default)]
    pub(super) device: Device,
}

impl<C: Default> Default for ExpectedSarsaConfig<C> {
    /// Constructs Expected SARSA config with default parameters.
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            replay_buffer: ReplayBufferConfig::default(),
            experience_replay_steps: 5,
            discount: 0.99,
            tau: 1.0,
            optimizer: OptimizerConfig::default(),
            critic_loss: CriticLoss::Mse,
            device: Device::Cpu,
        }
    }
}

impl<C> ExpectedSarsaConfig<C>
where
    C: OutDim + Clone + Serialize + DeserializeOwned,
{
    /// Sets the configuration of the Q-network.
    pub fn model_config(mut self, model_config: C) -> Self {
        self.model_config = model_config;
        self
    }

    /// Sets the number of actions, the output dimension of the Q-network.
    pub fn out_dim(mut self, out_dim: i64) -> Self {
        self.model_config.set_out_dim(out_dim);
        self
    }

    /// Sets the configuration of the replay buffer.
    pub fn replay_buffer(mut self, v: ReplayBufferConfig) -> Self {
        self.replay_buffer = v;
        self
    }

    /// Capacity of the replay buffer.
    pub fn capacity(mut self, v: usize) -> Self {
        self.replay_buffer.capacity = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.replay_buffer.batch_size = v;
        self
    }

    /// Shape of environment states.
    pub fn obs_shape(mut self, v: Vec<usize>) -> Self {
        self.replay_buffer.obs_shape = v;
        self
    }

    /// Sets the number of gradient steps per update.
    pub fn experience_replay_steps(mut self, v: usize) -> Self {
        self.experience_replay_steps = v;
        self
    }

    /// Discount factor.
    pub fn discount(mut self, v: f64) -> Self {
        self.discount = v;
        self
    }

    /// Temperature of the softmax policy.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    pub(super) fn softmax(&self) -> Result<Softmax> {
        Softmax::new(self.tau)
    }

    /// Optimizer.
    pub fn optimizer(mut self, v: OptimizerConfig) -> Self {
        self.optimizer = v;
        self
    }

    /// Critic loss.
    pub fn critic_loss(mut self, v: CriticLoss) -> Self {
        self.critic_loss = v;
        self
    }

    /// Device.
    pub fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Loads [`ExpectedSarsaConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of Expected SARSA agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`ExpectedSarsaConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of Expected SARSA agent into {:?}", path_);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mlp::MlpConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_expected_sarsa_config() -> Result<()> {
        let config = ExpectedSarsaConfig::<MlpConfig>::default()
            .model_config(MlpConfig::new(4, vec![32, 32], 2, false))
            .capacity(1000)
            .batch_size(32)
            .obs_shape(vec![4])
            .discount(0.9)
            .tau(0.5)
            .optimizer(OptimizerConfig::Adam { lr: 1e-4 });

        let dir = TempDir::new("expected_sarsa_config")?;
        let path = dir.path().join("expected_sarsa_config.yaml");
        println!("{:?}", path);

        config.save(&path)?;
        let config_ = ExpectedSarsaConfig::<MlpConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_defaults() {
        let config = ExpectedSarsaConfig::<MlpConfig>::default();
        assert_eq!(config.replay_buffer.capacity, 10000);
        assert_eq!(config.replay_buffer.batch_size, 64);
        assert_eq!(config.experience_replay_steps, 5);
        assert_eq!(config.discount, 0.99);
        assert_eq!(config.tau, 1.0);
        assert_eq!(config.optimizer, OptimizerConfig::Adam { lr: 1e-3 });
        assert!(config.clone().tau(0.0).softmax().is_err());
    }
}
