use super::{Record, Recorder, Source, SourceKind};
use crate::error::RlError;
use anyhow::Result;
use log::debug;

struct Subscription {
    recorder: Box<dyn Recorder>,
    sources: Vec<Source>,
}

impl Subscription {
    fn route(&mut self, kind: SourceKind, record: &Record) -> Result<()> {
        let sources = &self.sources;
        let selected = record.filter(|k| sources.iter().any(|s| s.matches(k, kind)));
        if selected.is_empty() {
            return Ok(());
        }
        self.recorder.write(kind, &selected)
    }
}

/// Routes records to subscribed [`Recorder`]s.
///
/// Sinks are registered with [`RecordObserver::add`] during setup. The first
/// call to [`RecordObserver::init`], or the first routed record, freezes the
/// set of sinks; registering one afterwards fails with
/// [`RlError::ForbiddenRecorderChange`].
#[derive(Default)]
pub struct RecordObserver {
    subscriptions: Vec<Subscription>,
    initialized: bool,
}

impl RecordObserver {
    /// Creates an observer without sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sink receiving the entries named by `sources`.
    pub fn add(&mut self, recorder: Box<dyn Recorder>, sources: Vec<Source>) -> Result<()> {
        if self.initialized {
            return Err(RlError::ForbiddenRecorderChange.into());
        }
        self.subscriptions.push(Subscription { recorder, sources });
        Ok(())
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns `true` if no sink is registered.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Initializes every sink and freezes the set of sinks.
    pub fn init(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        for sub in self.subscriptions.iter_mut() {
            debug!("Initialize recorder {}", sub.recorder.name());
            sub.recorder.init(&sub.sources)?;
        }
        self.initialized = true;
        Ok(())
    }

    fn route(&mut self, kind: SourceKind, record: &Record) -> Result<()> {
        self.init()?;
        for sub in self.subscriptions.iter_mut() {
            sub.route(kind, record)?;
        }
        Ok(())
    }

    /// Routes the payload given to an agent.
    pub fn update_observations(&mut self, record: &Record) -> Result<()> {
        self.route(SourceKind::Observation, record)
    }

    /// Routes values derived from an agent state.
    pub fn update_agent_state(&mut self, record: &Record) -> Result<()> {
        self.route(SourceKind::AgentState, record)
    }

    /// Routes metrics of an update.
    pub fn update_metrics(&mut self, record: &Record) -> Result<()> {
        self.route(SourceKind::Metric, record)
    }

    /// Finalizes every sink.
    pub fn finish(&mut self) -> Result<()> {
        for sub in self.subscriptions.iter_mut() {
            sub.recorder.finish()?;
        }
        Ok(())
    }
}
