//! Value-learning agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`Dqn`](dqn::Dqn): off-policy learner with ε-greedy exploration.
//! * [`ExpectedSarsa`](expected_sarsa::ExpectedSarsa): on-policy learner acting with a softmax policy.
//!
//! Both share the update protocol in [`value`]: every call appends one
//! transition to the replay buffer and, once the buffer holds a full batch,
//! runs a fixed number of gradient steps against a target snapshot taken at
//! the beginning of the call.
pub mod dqn;
pub mod expected_sarsa;
pub mod explorer;
pub mod mlp;
pub mod model;
pub mod obs;
pub mod opt;
pub mod util;
pub mod value;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl TryFrom<Device> for candle_core::Device {
    type Error = anyhow::Error;

    fn try_from(device: Device) -> Result<Self> {
        match device {
            Device::Cpu => Ok(candle_core::Device::Cpu),
            Device::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
