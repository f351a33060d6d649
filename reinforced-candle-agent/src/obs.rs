//! Payloads of value-learning agents.
use reinforced_core::{error::RlError, Observation};
use std::convert::TryFrom;

/// Payload of `update`: the outcome of the last action.
///
/// Fields: `env_state`, `action`, `reward`, `terminal`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionObs {
    /// State reached after the action.
    pub env_state: Vec<f32>,

    /// The action taken.
    pub action: i64,

    /// The reward received.
    pub reward: f32,

    /// `true` if the episode ended.
    pub terminal: bool,
}

impl TryFrom<&Observation> for TransitionObs {
    type Error = RlError;

    fn try_from(obs: &Observation) -> Result<Self, RlError> {
        Ok(Self {
            env_state: obs.get_array("env_state")?.into_iter().map(|x| x as f32).collect(),
            action: obs.get_usize("action")? as i64,
            reward: obs.get_f64("reward")? as f32,
            terminal: obs.get_bool("terminal")?,
        })
    }
}

/// Payload of `sample`: the current environment state.
///
/// Fields: `env_state`.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvStateObs {
    /// The current environment state.
    pub env_state: Vec<f32>,
}

impl TryFrom<&Observation> for EnvStateObs {
    type Error = RlError;

    fn try_from(obs: &Observation) -> Result<Self, RlError> {
        Ok(Self {
            env_state: obs.get_array("env_state")?.into_iter().map(|x| x as f32).collect(),
        })
    }
}
