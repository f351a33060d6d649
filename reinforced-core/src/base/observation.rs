//! Untyped observation payloads.
//!
//! An outer orchestration layer hands observations to agents as a map of
//! named values. Each agent declares a typed payload implementing
//! `TryFrom<&Observation, Error = RlError>`, built with the accessors below so
//! that a missing or malformed entry is reported with the name of the field.
use crate::{
    error::RlError,
    record::{Record, RecordValue},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value in an [`Observation`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum ObsValue {
    /// Floating point scalar.
    Float(f64),

    /// Integer scalar.
    Int(i64),

    /// Boolean flag.
    Bool(bool),

    /// Vector of floating point values.
    Array(Vec<f64>),
}

impl ObsValue {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Float(_) => "Float",
            Self::Int(_) => "Int",
            Self::Bool(_) => "Bool",
            Self::Array(_) => "Array",
        }
    }
}

impl From<f64> for ObsValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ObsValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<i64> for ObsValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for ObsValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<bool> for ObsValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<Vec<f64>> for ObsValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<f32>> for ObsValue {
    fn from(v: Vec<f32>) -> Self {
        Self::Array(v.into_iter().map(|x| x as f64).collect())
    }
}

/// A set of named observation values.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Observation(BTreeMap<String, ObsValue>);

impl Observation {
    /// Creates an empty observation.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds a value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ObsValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ObsValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&ObsValue> {
        self.0.get(name)
    }

    /// Iterates over the fields.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, ObsValue> {
        self.0.iter()
    }

    /// Converts the fields into a [`Record`] for logging.
    ///
    /// Integers and flags become scalars, arrays become [`RecordValue::Array1`].
    pub fn to_record(&self) -> Record {
        self.0
            .iter()
            .map(|(k, v)| {
                let v = match v {
                    ObsValue::Float(x) => RecordValue::Scalar(*x as f32),
                    ObsValue::Int(x) => RecordValue::Scalar(*x as f32),
                    ObsValue::Bool(x) => RecordValue::Scalar(*x as u8 as f32),
                    ObsValue::Array(xs) => RecordValue::Array1(xs.iter().map(|&x| x as f32).collect()),
                };
                (k.clone(), v)
            })
            .collect()
    }

    fn field(&self, name: &str) -> Result<&ObsValue, RlError> {
        self.0
            .get(name)
            .ok_or_else(|| RlError::MissingField(name.to_string()))
    }

    /// Reads a floating point scalar. Integers are widened.
    pub fn get_f64(&self, name: &str) -> Result<f64, RlError> {
        match self.field(name)? {
            ObsValue::Float(v) => Ok(*v),
            ObsValue::Int(v) => Ok(*v as f64),
            v => Err(RlError::invalid_field(
                name,
                format!("expected a scalar, got {}", v.type_name()),
            )),
        }
    }

    /// Reads an integer scalar.
    pub fn get_i64(&self, name: &str) -> Result<i64, RlError> {
        match self.field(name)? {
            ObsValue::Int(v) => Ok(*v),
            v => Err(RlError::invalid_field(
                name,
                format!("expected an integer, got {}", v.type_name()),
            )),
        }
    }

    /// Reads a non-negative integer.
    pub fn get_usize(&self, name: &str) -> Result<usize, RlError> {
        let v = self.get_i64(name)?;
        if v < 0 {
            return Err(RlError::invalid_field(
                name,
                format!("expected a non-negative integer, got {}", v),
            ));
        }
        Ok(v as usize)
    }

    /// Reads a boolean flag. Integers 0 and 1 are accepted.
    pub fn get_bool(&self, name: &str) -> Result<bool, RlError> {
        match self.field(name)? {
            ObsValue::Bool(v) => Ok(*v),
            ObsValue::Int(0) => Ok(false),
            ObsValue::Int(1) => Ok(true),
            v => Err(RlError::invalid_field(
                name,
                format!("expected a boolean, got {:?}", v),
            )),
        }
    }

    /// Reads a vector of floating point values.
    pub fn get_array(&self, name: &str) -> Result<Vec<f64>, RlError> {
        match self.field(name)? {
            ObsValue::Array(v) => Ok(v.clone()),
            v => Err(RlError::invalid_field(
                name,
                format!("expected an array, got {}", v.type_name()),
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_field_is_named() {
        let obs = Observation::new().with("reward", 1.0);
        assert_eq!(
            obs.get_f64("power"),
            Err(RlError::MissingField("power".to_string()))
        );
    }

    #[test]
    fn test_field_types() {
        let obs = Observation::new()
            .with("reward", 1.5)
            .with("action", 3usize)
            .with("terminal", false)
            .with("env_state", vec![0.5f32, 1.0]);

        assert_eq!(obs.get_f64("reward").unwrap(), 1.5);
        assert_eq!(obs.get_f64("action").unwrap(), 3.0);
        assert_eq!(obs.get_usize("action").unwrap(), 3);
        assert!(!obs.get_bool("terminal").unwrap());
        assert_eq!(obs.get_array("env_state").unwrap(), vec![0.5, 1.0]);

        match obs.get_i64("reward") {
            Err(RlError::InvalidField { name, .. }) => assert_eq!(name, "reward"),
            r => panic!("unexpected result: {:?}", r),
        }
    }
}
