//! Errors in the library.
use thiserror::Error;

/// Errors raised by agents, buffers and recorders.
///
/// Public APIs return [`anyhow::Result`]; values of this type can be recovered
/// from an [`anyhow::Error`] with `downcast_ref::<RlError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RlError {
    /// A construction parameter is out of its documented bounds.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        name: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// A required field is absent from an observation payload.
    #[error("Observation field '{0}' is missing")]
    MissingField(String),

    /// A field of an observation payload has a wrong type or value.
    #[error("Observation field '{name}' is invalid: {reason}")]
    InvalidField {
        /// Name of the field.
        name: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// Sampling was requested from a replay buffer holding no transitions.
    #[error("Cannot sample from an empty replay buffer")]
    EmptyBuffer,

    /// A recorder was given a value it does not know how to write.
    #[error("Recorder {sink} does not support logging {value_type}")]
    UnsupportedLogType {
        /// Name of the recorder.
        sink: String,
        /// Tag of the rejected value.
        value_type: String,
    },

    /// A recorder was added after the observer had been initialized.
    #[error("Cannot add new recorders after the first record has been routed")]
    ForbiddenRecorderChange,

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl RlError {
    /// Shorthand for [`RlError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`RlError::InvalidField`].
    pub fn invalid_field(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
