//! Binds an agent to its state and a stream of keys.
use crate::{
    record::{Record, RecordObserver},
    Agent, Observation, PrngKey,
};
use anyhow::Result;
use log::info;
use std::{convert::TryFrom, path::Path};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Drives one [`Agent`] with untyped [`Observation`]s.
///
/// The runner owns the only mutable copy of the agent state and a key from
/// which a fresh sub-key is split for every call. Observations, agent-state
/// values and update metrics are routed to an optional [`RecordObserver`].
///
/// ```mermaid
/// graph LR
///     O[Observation]-->|update|R[Runner]
///     R-->|"update_with_record(state, key, obs)"|A[Agent]
///     A-->|"(state', metrics)"|R
///     R-->|observations, agent state, metrics|L[RecordObserver]
///     O2[Observation]-->|sample|R
///     R-->|action|E[Environment]
/// ```
///
/// A failed call leaves the state as it was.
pub struct Runner<A: Agent> {
    agent: A,
    state: A::State,
    key: PrngKey,
    observer: Option<RecordObserver>,
}

impl<A: Agent> Runner<A> {
    /// Initializes the agent state from `key`.
    pub fn new(agent: A, key: PrngKey) -> Result<Self> {
        let (key, init_key) = key.split();
        let state = agent.init(init_key)?;
        Ok(Self {
            agent,
            state,
            key,
            observer: None,
        })
    }

    /// Routes records to `observer`.
    pub fn with_observer(mut self, observer: RecordObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The agent.
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// The current state.
    pub fn state(&self) -> &A::State {
        &self.state
    }

    /// Consumes the runner and returns the agent and its state.
    pub fn into_inner(self) -> (A, A::State) {
        (self.agent, self.state)
    }

    fn next_key(&mut self) -> PrngKey {
        let (next, key) = self.key.split();
        self.key = next;
        key
    }

    /// Selects an action for `obs`.
    pub fn sample(&mut self, obs: &Observation) -> Result<A::Action> {
        let key = self.next_key();
        let act = self.agent.sample_from(&self.state, key, obs)?;
        if let Some(observer) = self.observer.as_mut() {
            observer.update_observations(&obs.to_record())?;
        }
        Ok(act)
    }

    /// Updates the state with `obs` and returns the metrics of the update.
    pub fn update(&mut self, obs: &Observation) -> Result<Record> {
        let key = self.next_key();
        let payload = A::UpdateObs::try_from(obs)?;
        let (state, metrics) = self.agent.update_with_record(&self.state, key, &payload)?;

        // The state moves forward only once every record has been written.
        if let Some(observer) = self.observer.as_mut() {
            observer.update_observations(&obs.to_record())?;
            observer.update_agent_state(&self.agent.state_record(&state))?;
            observer.update_metrics(&metrics)?;
        }
        self.state = state;
        Ok(metrics)
    }

    /// Writes a checkpoint of the state.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.agent.save_state(&self.state, path)?;
        info!("Saved agent state to {:?}", path);
        Ok(())
    }

    /// Replaces the state with a checkpoint.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.state = self.agent.load_state(path)?;
        info!("Loaded agent state from {:?}", path);
        Ok(())
    }

    /// Finalizes the recorders.
    pub fn finish(&mut self) -> Result<()> {
        match self.observer.as_mut() {
            Some(observer) => observer.finish(),
            None => Ok(()),
        }
    }
}
