//! Configuration of DQN agent.
use crate::{
    explorer::EpsilonGreedy,
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

#[allow(clippy::upper_case_acronyms)]
/// Configuration of [`Dqn`](super::Dqn).
///
/// `C` is the configuration of the Q-network; its output dimension is the
/// number of actions.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<C> {
    pub(super) model_config: C,
    pub(super) replay_buffer: ReplayBufferConfig,
    pub(super) experience_replay_steps: usize,
    pub(super) discount: f64,
    pub(super) explorer: EpsilonGreedy,
    pub(super) optimizer: OptimizerConfig,
    #[serde(default)]
    pub(super) critic_loss: CriticLoss,
    #[serde(default)]
    pub(super) device: Device,
}

impl<C: Default> Default for DqnConfig<C> {
    /// Constructs DQN config with default parameters.
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            replay_buffer: ReplayBufferConfig::default(),
            experience_replay_steps: 5,
            discount: 0.99,
            explorer: EpsilonGreedy::default(),
            optimizer: OptimizerConfig::default(),
            critic_loss: CriticLoss::Mse,
            device: Device::Cpu,
        }
    }
}

impl<C> DqnConfig<C>
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

    /// Explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Initial epsilon.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.explorer.epsilon = v;
        self
    }

    /// Decay factor of epsilon.
    pub fn epsilon_decay(mut self, v: f64) -> Self {
        self.explorer.epsilon_decay = v;
        self
    }

    /// Lower bound of epsilon.
    pub fn epsilon_min(mut self, v: f64) -> Self {
        self.explorer.epsilon_min = v;
        self
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

    /// Loads [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN agent from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN agent into {:?}", path_);
        Ok(())
    }
}
