//! DQN agent implemented with candle.
use super::config::DqnConfig;
use crate::{
    explorer::EpsilonGreedy,
    model::QNetwork,
    obs::{EnvStateObs, TransitionObs},
    util::param_stats,
    value::{MaxTarget, ValueLearner, ValueState},
};
use anyhow::Result;
use log::{info, warn};
use reinforced_core::{
    record::{Record, RecordValue},
    util::categorical,
    Agent, Configurable, PrngKey, Space, SpaceDict,
};
use std::{convert::TryInto, fs, path::Path};

const EPSILON_FILE: &str = "epsilon.bin";

/// State of [`Dqn`].
#[derive(Clone, Debug)]
pub struct DqnState {
    /// Network, optimizer and replay buffer.
    pub value: ValueState,

    /// Current exploration rate.
    pub epsilon: f64,
}

#[allow(clippy::upper_case_acronyms)]
/// Deep Q-learning agent with ε-greedy exploration.
///
/// The bootstrapped target is `reward + (1 - terminal) * discount * max_a' Q_target(s', a')`.
/// Epsilon decays multiplicatively after every update, down to `epsilon_min`.
pub struct Dqn<Q: QNetwork> {
    learner: ValueLearner<Q>,
    explorer: EpsilonGreedy,
    config: DqnConfig<Q::Config>,
}

impl<Q: QNetwork> Dqn<Q> {
    /// The configuration.
    pub fn config(&self) -> &DqnConfig<Q::Config> {
        &self.config
    }

    /// Number of gradient steps per update once the buffer is ready.
    pub fn experience_replay_steps(&self) -> usize {
        self.learner.experience_replay_steps()
    }

    /// Probabilities with which [`Agent::sample`] picks each action.
    pub fn action_probs(&self, state: &DqnState, key: PrngKey, obs: &EnvStateObs) -> Result<Vec<f64>> {
        let q = self.learner.q_values(&state.value, key, &obs.env_state)?;
        Ok(EpsilonGreedy::probs(&q, state.epsilon))
    }
}

impl<Q: QNetwork> Configurable for Dqn<Q> {
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    fn build(config: Self::Config) -> Result<Self> {
        config.explorer.validate()?;
        let qnet = Q::build(config.model_config.clone())?;
        let learner = ValueLearner::new(
            qnet,
            config.replay_buffer.clone(),
            config.experience_replay_steps,
            config.discount,
            config.optimizer.clone(),
            config.critic_loss,
            config.device.try_into()?,
        )?;
        info!("Build DQN agent with {} actions", learner.n_actions());

        Ok(Self {
            learner,
            explorer: config.explorer,
            config,
        })
    }
}

impl<Q: QNetwork> Agent for Dqn<Q> {
    type State = DqnState;
    type UpdateObs = TransitionObs;
    type SampleObs = EnvStateObs;
    type Action = usize;

    fn parameter_space() -> SpaceDict {
        SpaceDict::new(vec![
            ("obs_space_shape", Space::Sequence(Box::new(Space::int(1.0, f64::INFINITY)))),
            ("act_space_size", Space::int(1.0, f64::INFINITY)),
            ("experience_replay_buffer_size", Space::int(1.0, f64::INFINITY)),
            ("experience_replay_batch_size", Space::int(1.0, f64::INFINITY)),
            ("experience_replay_steps", Space::int(1.0, f64::INFINITY)),
            ("discount", Space::scalar(0.0, 1.0)),
            ("epsilon", Space::scalar(0.0, 1.0)),
            ("epsilon_decay", Space::scalar(0.0, 1.0)),
            ("epsilon_min", Space::scalar(0.0, 1.0)),
        ])
    }

    fn update_observation_space(&self) -> SpaceDict {
        SpaceDict::new(vec![
            ("env_state", Space::array(f64::NEG_INFINITY, f64::INFINITY, self.learner.obs_shape())),
            ("action", Space::Discrete(self.learner.n_actions())),
            ("reward", Space::scalar(f64::NEG_INFINITY, f64::INFINITY)),
            ("terminal", Space::MultiBinary(1)),
        ])
    }

    fn sample_observation_space(&self) -> SpaceDict {
        SpaceDict::new(vec![(
            "env_state",
            Space::array(f64::NEG_INFINITY, f64::INFINITY, self.learner.obs_shape()),
        )])
    }

    fn action_space(&self) -> Space {
        Space::Discrete(self.learner.n_actions())
    }

    fn init(&self, key: PrngKey) -> Result<DqnState> {
        Ok(DqnState {
            value: self.learner.init(key)?,
            epsilon: self.explorer.epsilon,
        })
    }

    fn update_with_record(
        &self,
        state: &DqnState,
        key: PrngKey,
        obs: &TransitionObs,
    ) -> Result<(DqnState, Record)> {
        let (value, info) = self.learner.update(&state.value, key, obs, &MaxTarget)?;
        let state = DqnState {
            value,
            epsilon: self.explorer.decay(state.epsilon),
        };

        let mut record = info.record();
        record.insert("epsilon", RecordValue::Scalar(state.epsilon as f32));
        Ok((state, record))
    }

    fn sample(&self, state: &DqnState, key: PrngKey, obs: &EnvStateObs) -> Result<usize> {
        let (net_key, act_key) = key.split();
        let probs = self.action_probs(state, net_key, obs)?;
        categorical(act_key, &probs)
    }

    fn state_record(&self, state: &DqnState) -> Record {
        let mut record = Record::from_slice(&[
            ("epsilon", RecordValue::Scalar(state.epsilon as f32)),
            ("buffer_len", RecordValue::Scalar(state.value.buffer.len() as f32)),
        ]);
        match param_stats(&state.value.params) {
            Ok(stats) => record.merge_inplace(stats),
            Err(e) => warn!("Skip parameter statistics: {}", e),
        }
        record
    }

    fn save_state(&self, state: &DqnState, path: &Path) -> Result<()> {
        state.value.save(path)?;
        fs::write(path.join(EPSILON_FILE), bincode::serialize(&state.epsilon)?)?;
        Ok(())
    }

    fn load_state(&self, path: &Path) -> Result<DqnState> {
        Ok(DqnState {
            value: self.learner.load(path)?,
            epsilon: bincode::deserialize(&fs::read(path.join(EPSILON_FILE))?)?,
        })
    }
}
