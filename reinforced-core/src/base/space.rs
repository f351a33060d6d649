//! Declarative descriptions of parameters, observations and actions.
//!
//! These are descriptors consumed by an outer validation layer. Nothing in
//! this crate checks values against them.
use serde::{Deserialize, Serialize};

/// Element type of a [`Space::Box`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ElemType {
    /// Floating point values.
    Float,

    /// Integer values.
    Int,
}

/// A set of admissible values.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum Space {
    /// Values of the given shape with every element in `[low, high]`.
    Box {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
        /// Shape of the value.
        shape: Vec<usize>,
        /// Element type.
        dtype: ElemType,
    },

    /// Integers in `0..n`.
    Discrete(usize),

    /// Binary vectors of the given length.
    MultiBinary(usize),

    /// Sequences of values of the inner space.
    Sequence(Box<Space>),
}

impl Space {
    /// A one-element float box.
    pub fn scalar(low: f64, high: f64) -> Self {
        Self::Box {
            low,
            high,
            shape: vec![1],
            dtype: ElemType::Float,
        }
    }

    /// A one-element integer box.
    pub fn int(low: f64, high: f64) -> Self {
        Self::Box {
            low,
            high,
            shape: vec![1],
            dtype: ElemType::Int,
        }
    }

    /// A float box of the given shape.
    pub fn array(low: f64, high: f64, shape: &[usize]) -> Self {
        Self::Box {
            low,
            high,
            shape: shape.to_vec(),
            dtype: ElemType::Float,
        }
    }
}

/// Named spaces in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SpaceDict(Vec<(String, Space)>);

impl SpaceDict {
    /// Creates a dictionary from `(name, space)` pairs.
    pub fn new<K: Into<String>>(entries: Vec<(K, Space)>) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns the space of the given name.
    pub fn get(&self, name: &str) -> Option<&Space> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Names of the entries in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Space)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there is no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
