use super::{target::td_target, BootstrapTarget, TargetSnapshot, ValueState};
use crate::{
    model::QNetwork,
    obs::TransitionObs,
    opt::OptimizerConfig,
    util::{gradient_step, BatchTensors, CriticLoss, InDim, OutDim},
};
use anyhow::Result;
use candle_core::{shape::D, Device, Tensor};
use log::{debug, trace};
use reinforced_core::{
    error::RlError,
    record::{Record, RecordValue},
    replay_buffer::{ReplayBuffer, ReplayBufferConfig},
    PrngKey,
};
use std::path::Path;

/// Outcome of [`ValueLearner::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateInfo {
    /// Number of gradient steps applied, `0` while the buffer is not ready.
    pub n_grad_steps: usize,

    /// Mean loss over the gradient steps, if any.
    pub loss: Option<f32>,
}

impl UpdateInfo {
    /// `n_grad_steps` and, if any step was applied, `loss`.
    pub fn record(&self) -> Record {
        let mut record = Record::from_scalar("n_grad_steps", self.n_grad_steps as f32);
        if let Some(loss) = self.loss {
            record.insert("loss", RecordValue::Scalar(loss));
        }
        record
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Replay-based learning of a Q-network.
///
/// [`ValueLearner::update`] runs the following for every environment step:
///
/// ```mermaid
/// graph TD
///     A["append (prev_env_state, action, reward, terminal, env_state)"] --> B{buffer ready?}
///     B -->|no| E[return state, 0 gradient steps]
///     B -->|yes| C[capture target snapshot]
///     C --> D["repeat experience_replay_steps times:<br/>sample batch, loss against snapshot, gradient step"]
///     D --> F[return updated state]
/// ```
///
/// The snapshot is taken once per call and dropped at the end of it; it is not
/// part of [`ValueState`]. The agents differ only in the [`BootstrapTarget`]
/// used to value the next state.
pub struct ValueLearner<Q: QNetwork> {
    qnet: Q,
    replay_buffer: ReplayBufferConfig,
    experience_replay_steps: usize,
    discount: f64,
    optimizer: OptimizerConfig,
    critic_loss: CriticLoss,
    device: Device,
}

impl<Q: QNetwork> ValueLearner<Q> {
    /// Creates a learner, checking `experience_replay_steps >= 1`, `0 <= discount <= 1`,
    /// the replay buffer configuration and that the network input matches the state shape.
    pub fn new(
        qnet: Q,
        replay_buffer: ReplayBufferConfig,
        experience_replay_steps: usize,
        discount: f64,
        optimizer: OptimizerConfig,
        critic_loss: CriticLoss,
        device: Device,
    ) -> Result<Self> {
        replay_buffer.validate()?;
        if experience_replay_steps < 1 {
            return Err(RlError::invalid_parameter("experience_replay_steps", "must be at least 1").into());
        }
        if !(0.0..=1.0).contains(&discount) {
            return Err(RlError::invalid_parameter("discount", format!("must be in [0, 1], got {}", discount)).into());
        }
        if qnet.config().get_out_dim() < 1 {
            return Err(RlError::invalid_parameter("act_space_size", "must be at least 1").into());
        }
        let in_dim = qnet.config().get_in_dim();
        if in_dim != replay_buffer.obs_dim() as i64 {
            return Err(RlError::invalid_parameter(
                "obs_shape",
                format!(
                    "{:?} holds {} values but the network takes {} inputs",
                    replay_buffer.obs_shape,
                    replay_buffer.obs_dim(),
                    in_dim
                ),
            )
            .into());
        }

        Ok(Self {
            qnet,
            replay_buffer,
            experience_replay_steps,
            discount,
            optimizer,
            critic_loss,
            device,
        })
    }

    /// The Q-network.
    pub fn qnet(&self) -> &Q {
        &self.qnet
    }

    /// Number of actions.
    pub fn n_actions(&self) -> usize {
        self.qnet.config().get_out_dim() as usize
    }

    /// Shape of an environment state.
    pub fn obs_shape(&self) -> &[usize] {
        &self.replay_buffer.obs_shape
    }

    /// The device tensors live on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Number of gradient steps per update once the buffer is ready.
    pub fn experience_replay_steps(&self) -> usize {
        self.experience_replay_steps
    }

    /// Initial state: fresh network, empty buffer, all-zero previous environment state.
    pub fn init(&self, key: PrngKey) -> Result<ValueState> {
        let (params, net_state) = self.qnet.init(key, &self.device)?;
        let opt_state = self.optimizer.init(&params)?;
        debug!("Initialized Q-network with {} parameters", params.elem_count());

        Ok(ValueState {
            params,
            net_state,
            opt_state,
            buffer: ReplayBuffer::build(&self.replay_buffer)?,
            prev_env_state: vec![0.0; self.replay_buffer.obs_dim()],
        })
    }

    /// Restores a state written by [`ValueState::save`], rejecting checkpoints
    /// whose replay buffer was built from another configuration.
    pub fn load(&self, path: &Path) -> Result<ValueState> {
        let state = ValueState::load(path, &self.device)?;
        let buffer = &state.buffer;
        let config = &self.replay_buffer;
        if buffer.obs_shape() != config.obs_shape.as_slice() {
            return Err(RlError::invalid_field(
                "obs_shape",
                format!("checkpoint holds {:?}, expected {:?}", buffer.obs_shape(), config.obs_shape),
            )
            .into());
        }
        if buffer.capacity() != config.capacity {
            return Err(RlError::invalid_field(
                "capacity",
                format!("checkpoint holds {}, expected {}", buffer.capacity(), config.capacity),
            )
            .into());
        }
        if buffer.batch_size() != config.batch_size {
            return Err(RlError::invalid_field(
                "batch_size",
                format!("checkpoint holds {}, expected {}", buffer.batch_size(), config.batch_size),
            )
            .into());
        }
        self.check_env_state(&state.prev_env_state)?;
        Ok(state)
    }

    fn check_env_state(&self, env_state: &[f32]) -> Result<()> {
        let obs_dim = self.replay_buffer.obs_dim();
        if env_state.len() != obs_dim {
            return Err(RlError::invalid_field(
                "env_state",
                format!("expected {} values, got {}", obs_dim, env_state.len()),
            )
            .into());
        }
        Ok(())
    }

    /// Action values of a single environment state.
    pub fn q_values(&self, state: &ValueState, key: PrngKey, env_state: &[f32]) -> Result<Vec<f32>> {
        self.check_env_state(env_state)?;
        let xs = Tensor::from_slice(env_state, (1, env_state.len()), &self.device)?;
        let (q, _) = self.qnet.forward(&state.params, &state.net_state, key, &xs)?;
        Ok(q.squeeze(0)?.to_vec1::<f32>()?)
    }

    /// Records the transition and learns from the replay buffer once it is ready.
    pub fn update<T: BootstrapTarget>(
        &self,
        state: &ValueState,
        key: PrngKey,
        obs: &TransitionObs,
        target: &T,
    ) -> Result<(ValueState, UpdateInfo)> {
        self.check_env_state(&obs.env_state)?;
        if obs.action < 0 || obs.action as usize >= self.n_actions() {
            return Err(RlError::invalid_field(
                "action",
                format!("expected an action in 0..{}, got {}", self.n_actions(), obs.action),
            )
            .into());
        }

        let buffer = state.buffer.clone().append(
            &state.prev_env_state,
            obs.action,
            obs.reward,
            obs.terminal,
            &obs.env_state,
        )?;
        let mut state = ValueState {
            buffer,
            prev_env_state: obs.env_state.clone(),
            ..state.clone()
        };

        if !state.buffer.is_ready() {
            trace!("Replay buffer holds {} transitions, skip learning", state.buffer.len());
            let info = UpdateInfo {
                n_grad_steps: 0,
                loss: None,
            };
            return Ok((state, info));
        }

        let snapshot = TargetSnapshot::capture(&state.params, &state.net_state)?;
        let mut loss_sum = 0f32;
        for key in key.split_n(self.experience_replay_steps) {
            let (next, loss) = self.learn(state, &snapshot, key, target)?;
            state = next;
            loss_sum += loss;
        }

        let info = UpdateInfo {
            n_grad_steps: self.experience_replay_steps,
            loss: Some(loss_sum / self.experience_replay_steps as f32),
        };
        debug!("{:?}", info);
        Ok((state, info))
    }

    fn learn<T: BootstrapTarget>(
        &self,
        state: ValueState,
        snapshot: &TargetSnapshot,
        key: PrngKey,
        target: &T,
    ) -> Result<(ValueState, f32)> {
        let keys = key.split_n(3);
        let batch = BatchTensors::from_batch(state.buffer.sample(keys[0])?, &self.device)?;

        let (q_next, _) = self
            .qnet
            .forward(snapshot.params(), snapshot.net_state(), keys[1], &batch.next_obs)?;
        let tgt = td_target(
            &batch.reward,
            &batch.not_done,
            self.discount,
            &target.next_value(&q_next.detach())?,
        )?;

        let net_state = &state.net_state;
        let step = gradient_step(&self.optimizer, &state.params, &state.opt_state, |params| {
            let (q, net_state) = self.qnet.forward(params, net_state, keys[2], &batch.obs)?;
            let pred = q.gather(&batch.act, D::Minus1)?.squeeze(D::Minus1)?;
            Ok((self.critic_loss.loss(&pred, &tgt)?, net_state))
        })?;
        trace!("loss = {}", step.loss);

        let state = ValueState {
            params: step.params,
            net_state: step.aux,
            opt_state: step.opt_state,
            ..state
        };
        Ok((state, step.loss))
    }
}
