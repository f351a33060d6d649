//! Expected SARSA agent implemented with candle.
use super::config::ExpectedSarsaConfig;
use crate::{
    explorer::Softmax,
    model::QNetwork,
    obs::{EnvStateObs, TransitionObs},
    util::param_stats,
    value::{ExpectedTarget, ValueLearner, ValueState},
};
use anyhow::Result;
use log::{info, warn};
use reinforced_core::{
    record::{Record, RecordValue},
    util::categorical,
    Agent, Configurable, PrngKey, Space, SpaceDict,
};
use std::{convert::TryInto, path::Path};

/// On-policy value learner acting with a softmax policy.
///
/// The bootstrapped target is the expected value of the next state under the
/// softmax policy of the target network,
/// `reward + (1 - terminal) * discount * sum_a' softmax(Q_target(s', .) / tau)[a'] * Q_target(s', a')`.
/// There is no decaying exploration rate; exploration depends on `tau` only.
pub struct ExpectedSarsa<Q: QNetwork> {
    learner: ValueLearner<Q>,
    softmax: Softmax,
    config: ExpectedSarsaConfig<Q::Config>,
}

impl<Q: QNetwork> ExpectedSarsa<Q> {
    /// The configuration.
    pub fn config(&self) -> &ExpectedSarsaConfig<Q::Config> {
        &self.config
    }

    /// Number of gradient steps per update once the buffer is ready.
    pub fn experience_replay_steps(&self) -> usize {
        self.learner.experience_replay_steps()
    }

    /// Probabilities with which [`Agent::sample`] picks each action.
    pub fn action_probs(&self, state: &ValueState, key: PrngKey, obs: &EnvStateObs) -> Result<Vec<f64>> {
        let q = self.learner.q_values(state, key, &obs.env_state)?;
        Ok(self.softmax.probs(&q))
    }
}

impl<Q: QNetwork> Configurable for ExpectedSarsa<Q> {
    type Config = ExpectedSarsaConfig<Q::Config>;

    fn build(config: Self::Config) -> Result<Self> {
        let softmax = config.softmax()?;
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
        info!("Build Expected SARSA agent with {} actions", learner.n_actions());

        Ok(Self {
            learner,
            softmax,
            config,
        })
    }
}

impl<Q: QNetwork> Agent for ExpectedSarsa<Q> {
    type State = ValueState;
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
            ("tau", Space::scalar(0.0, f64::INFINITY)),
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

    fn init(&self, key: PrngKey) -> Result<ValueState> {
        self.learner.init(key)
    }

    fn update_with_record(
        &self,
        state: &ValueState,
        key: PrngKey,
        obs: &TransitionObs,
    ) -> Result<(ValueState, Record)> {
        let (state, info) = self
            .learner
            .update(state, key, obs, &ExpectedTarget(self.softmax))?;
        Ok((state, info.record()))
    }

    fn sample(&self, state: &ValueState, key: PrngKey, obs: &EnvStateObs) -> Result<usize> {
        let (net_key, act_key) = key.split();
        let probs = self.action_probs(state, net_key, obs)?;
        categorical(act_key, &probs)
    }

    fn state_record(&self, state: &ValueState) -> Record {
        let mut record = Record::from_slice(&[(
            "buffer_len",
            RecordValue::Scalar(state.buffer.len() as f32),
        )]);
        match param_stats(&state.params) {
            Ok(stats) => record.merge_inplace(stats),
            Err(e) => warn!("Skip parameter statistics: {}", e),
        }
        record
    }

    fn save_state(&self, state: &ValueState, path: &Path) -> Result<()> {
        state.save(path)
    }

    fn load_state(&self, path: &Path) -> Result<ValueState> {
        self.learner.load(path)
    }
}
