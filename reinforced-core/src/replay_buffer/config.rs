//! Configuration of [`ReplayBuffer`](super::ReplayBuffer).
use crate::error::RlError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Configuration of [`ReplayBuffer`](super::ReplayBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ReplayBufferConfig {
    /// The maximum number of transitions held at once.
    pub capacity: usize,

    /// The number of transitions in a sampled batch.
    pub batch_size: usize,

    /// Shape of an environment state.
    pub obs_shape: Vec<usize>,
}

impl Default for ReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            batch_size: 64,
            obs_shape: vec![1],
        }
    }
}

impl ReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the shape of environment states.
    pub fn obs_shape(mut self, obs_shape: Vec<usize>) -> Self {
        self.obs_shape = obs_shape;
        self
    }

    /// The number of scalars in a flattened environment state.
    pub fn obs_dim(&self) -> usize {
        self.obs_shape.iter().product()
    }

    /// Checks `0 < batch_size < capacity` and a non-empty state shape.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(RlError::invalid_parameter("batch_size", "must be positive").into());
        }
        if self.batch_size >= self.capacity {
            return Err(RlError::invalid_parameter(
                "capacity",
                format!(
                    "must be greater than batch_size ({} <= {})",
                    self.capacity, self.batch_size
                ),
            )
            .into());
        }
        if self.obs_shape.is_empty() || self.obs_dim() == 0 {
            return Err(RlError::invalid_parameter(
                "obs_shape",
                format!("must be a non-empty shape, got {:?}", self.obs_shape),
            )
            .into());
        }
        Ok(())
    }
}
