use crate::{opt::OptState, util::NamedTensors};
use anyhow::Result;
use candle_core::Device;
use log::info;
use reinforced_core::replay_buffer::ReplayBuffer;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

const PARAMS_FILE: &str = "params.safetensors";
const NET_STATE_FILE: &str = "net_state.safetensors";
const OPT_M_FILE: &str = "opt_m.safetensors";
const OPT_V_FILE: &str = "opt_v.safetensors";
const STATE_FILE: &str = "state.bin";

/// State shared by the value-learning agents.
#[derive(Clone, Debug)]
pub struct ValueState {
    /// Parameters of the Q-network.
    pub params: NamedTensors,

    /// Non-trainable state of the Q-network.
    pub net_state: NamedTensors,

    /// State of the optimizer.
    pub opt_state: OptState,

    /// Replay buffer.
    pub buffer: ReplayBuffer,

    /// Environment state given to the previous update, the first state of the next transition.
    pub prev_env_state: Vec<f32>,
}

#[derive(Deserialize, Serialize)]
struct Scalars {
    buffer: ReplayBuffer,
    prev_env_state: Vec<f32>,
    opt_step: u64,
}

fn save_tensors(tensors: &NamedTensors, path: &Path) -> Result<()> {
    if !tensors.is_empty() {
        tensors.save(path)?;
    }
    Ok(())
}

fn load_tensors(path: &Path, device: &Device) -> Result<NamedTensors> {
    if path.exists() {
        NamedTensors::load(path, device)
    } else {
        Ok(NamedTensors::new())
    }
}

impl ValueState {
    /// Writes the state into directory `path`, creating it if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        save_tensors(&self.params, &path.join(PARAMS_FILE))?;
        save_tensors(&self.net_state, &path.join(NET_STATE_FILE))?;
        save_tensors(&self.opt_state.m, &path.join(OPT_M_FILE))?;
        save_tensors(&self.opt_state.v, &path.join(OPT_V_FILE))?;

        let scalars = Scalars {
            buffer: self.buffer.clone(),
            prev_env_state: self.prev_env_state.clone(),
            opt_step: self.opt_state.step,
        };
        fs::write(path.join(STATE_FILE), bincode::serialize(&scalars)?)?;
        info!("Save agent state into {:?}", path);
        Ok(())
    }

    /// Restores a state written by [`ValueState::save`] onto `device`.
    pub fn load(path: &Path, device: &Device) -> Result<Self> {
        let scalars: Scalars = bincode::deserialize(&fs::read(path.join(STATE_FILE))?)?;
        let state = Self {
            params: load_tensors(&path.join(PARAMS_FILE), device)?,
            net_state: load_tensors(&path.join(NET_STATE_FILE), device)?,
            opt_state: OptState {
                step: scalars.opt_step,
                m: load_tensors(&path.join(OPT_M_FILE), device)?,
                v: load_tensors(&path.join(OPT_V_FILE), device)?,
            },
            buffer: scalars.buffer,
            prev_env_state: scalars.prev_env_state,
        };
        info!("Load agent state from {:?}", path);
        Ok(state)
    }
}
