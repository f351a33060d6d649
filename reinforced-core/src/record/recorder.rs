use super::Record;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Origin of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum SourceKind {
    /// Payloads given to an agent.
    Observation,

    /// Values derived from the state of an agent.
    AgentState,

    /// Metrics returned by an update.
    Metric,
}

impl SourceKind {
    /// All kinds.
    pub const ALL: [SourceKind; 3] = [Self::Observation, Self::AgentState, Self::Metric];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Observation => "observation",
            Self::AgentState => "agent_state",
            Self::Metric => "metric",
        };
        write!(f, "{}", s)
    }
}

/// A record entry a [`Recorder`] subscribes to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Source {
    /// Key of the entry.
    pub name: String,

    /// Kind of record the entry must come from; `None` matches every kind.
    pub kind: Option<SourceKind>,
}

impl Source {
    /// Subscribes to the entry `name` of any kind of record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
        }
    }

    /// Subscribes to the entry `name` of records of the given kind.
    pub fn of_kind(name: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind),
        }
    }

    /// Returns `true` if the entry `name` of a record of `kind` matches this source.
    pub fn matches(&self, name: &str, kind: SourceKind) -> bool {
        self.name == name && self.kind.map_or(true, |k| k == kind)
    }
}

/// A sink of records.
///
/// A sink that cannot represent a value returns
/// [`RlError::UnsupportedLogType`](crate::error::RlError::UnsupportedLogType)
/// from [`Recorder::write`].
pub trait Recorder {
    /// Name of the sink, used in error messages.
    fn name(&self) -> &str;

    /// Called once before the first write with the sources the sink subscribed to.
    #[allow(unused_variables)]
    fn init(&mut self, sources: &[Source]) -> Result<()> {
        Ok(())
    }

    /// Writes a record of the given kind.
    fn write(&mut self, kind: SourceKind, record: &Record) -> Result<()>;

    /// Flushes and closes the sink.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
