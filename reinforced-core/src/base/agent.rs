//! Agent.
use super::{Observation, Space, SpaceDict};
use crate::{error::RlError, record::Record, PrngKey};
use anyhow::Result;
use std::{convert::TryFrom, path::Path};

/// A decision algorithm driven through explicit state values.
///
/// An agent object holds only its immutable configuration. Everything that
/// changes over time lives in [`Agent::State`], which is threaded linearly
/// through the calls: every call takes the current state by reference and
/// returns a new one, so a failed call leaves the caller's state untouched and
/// free to be reused. Randomness comes exclusively from the [`PrngKey`] given to
/// each call; with identical states, keys and observations the outputs are
/// identical.
///
/// The payloads of [`Agent::update`] and [`Agent::sample`] are typed. An outer
/// layer holding untyped [`Observation`]s goes through [`Agent::update_from`]
/// and [`Agent::sample_from`], which report missing or malformed fields by
/// name.
pub trait Agent {
    /// State of the agent.
    type State: Clone;

    /// Payload of [`Agent::update`].
    type UpdateObs: for<'a> TryFrom<&'a Observation, Error = RlError>;

    /// Payload of [`Agent::sample`].
    type SampleObs: for<'a> TryFrom<&'a Observation, Error = RlError>;

    /// Action emitted by [`Agent::sample`].
    type Action;

    /// Named construction parameters with their admissible values.
    fn parameter_space() -> SpaceDict
    where
        Self: Sized;

    /// Fields expected in the payload of [`Agent::update`].
    fn update_observation_space(&self) -> SpaceDict;

    /// Fields expected in the payload of [`Agent::sample`].
    fn sample_observation_space(&self) -> SpaceDict;

    /// Admissible actions.
    fn action_space(&self) -> Space;

    /// Creates the initial state.
    fn init(&self, key: PrngKey) -> Result<Self::State>;

    /// Computes the next state and returns it with metrics of the update.
    fn update_with_record(
        &self,
        state: &Self::State,
        key: PrngKey,
        obs: &Self::UpdateObs,
    ) -> Result<(Self::State, Record)>;

    /// Computes the next state.
    fn update(&self, state: &Self::State, key: PrngKey, obs: &Self::UpdateObs) -> Result<Self::State> {
        Ok(self.update_with_record(state, key, obs)?.0)
    }

    /// Selects an action.
    fn sample(&self, state: &Self::State, key: PrngKey, obs: &Self::SampleObs)
        -> Result<Self::Action>;

    /// [`Agent::update`] with an untyped payload.
    fn update_from(&self, state: &Self::State, key: PrngKey, obs: &Observation) -> Result<Self::State> {
        let obs = Self::UpdateObs::try_from(obs)?;
        self.update(state, key, &obs)
    }

    /// [`Agent::sample`] with an untyped payload.
    fn sample_from(&self, state: &Self::State, key: PrngKey, obs: &Observation) -> Result<Self::Action> {
        let obs = Self::SampleObs::try_from(obs)?;
        self.sample(state, key, &obs)
    }

    /// Values of the state worth logging.
    #[allow(unused_variables)]
    fn state_record(&self, state: &Self::State) -> Record {
        Record::empty()
    }

    /// Writes a checkpoint of the state at the given path.
    fn save_state(&self, state: &Self::State, path: &Path) -> Result<()>;

    /// Restores a state written by [`Agent::save_state`].
    fn load_state(&self, path: &Path) -> Result<Self::State>;
}
