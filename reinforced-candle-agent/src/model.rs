//! Interface of the function approximators used by value-learning agents.
use crate::util::{InDim, NamedTensors, OutDim};
use anyhow::Result;
use candle_core::{Device, Tensor};
use reinforced_core::PrngKey;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// A Q-network in functional form.
///
/// The network object holds only its architecture. Trainable parameters and
/// non-trainable state (e.g. running statistics) are passed in and returned
/// explicitly, so that an agent state can hold them as plain values and a
/// target snapshot is just a copy of them.
pub trait QNetwork {
    /// Configuration from which the network is built.
    type Config: InDim + OutDim + Clone + Debug + PartialEq + Serialize + DeserializeOwned;

    /// Builds the network.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// The configuration.
    fn config(&self) -> &Self::Config;

    /// Creates the initial parameters and network state on `device`.
    fn init(&self, key: PrngKey, device: &Device) -> Result<(NamedTensors, NamedTensors)>;

    /// Computes action values `(batch_size, n_actions)` for states `xs` of shape
    /// `(batch_size, in_dim)`, returning the updated network state.
    fn forward(
        &self,
        params: &NamedTensors,
        net_state: &NamedTensors,
        key: PrngKey,
        xs: &Tensor,
    ) -> Result<(Tensor, NamedTensors)>;
}
