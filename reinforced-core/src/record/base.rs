//! Records and their values.
use crate::error::RlError;
use chrono::prelude::{DateTime, Local};
use std::{
    collections::{
        hash_map::{IntoIter, Iter, Keys},
        BTreeMap, HashMap,
    },
    convert::Into,
    iter::{FromIterator, IntoIterator},
};

/// A value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single value, typically a metric like loss or epsilon.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f32>),

    /// A 2-dimensional array in row-major order with its shape.
    Array2(Vec<f32>, [usize; 2]),

    /// Named scalars meant to be displayed together.
    Dict(BTreeMap<String, f32>),

    /// A text value.
    String(String),
}

impl RecordValue {
    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "Scalar",
            Self::DateTime(_) => "DateTime",
            Self::Array1(_) => "Array1",
            Self::Array2(..) => "Array2",
            Self::Dict(_) => "Dict",
            Self::String(_) => "String",
        }
    }
}

/// A map from names to [`RecordValue`]s.
///
/// ```rust
/// use reinforced_core::record::{Record, RecordValue};
///
/// let mut record = Record::from_scalar("loss", 0.5);
/// record.insert("q", RecordValue::Array1(vec![0.1, 0.2]));
/// assert_eq!(record.get_scalar("loss").unwrap(), 0.5);
/// assert!(record.get_scalar("q").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record has no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` win on duplicated keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Returns the entries whose key satisfies `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&str) -> bool) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| pred(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    fn get_or_key_error(&self, k: &str) -> Result<&RecordValue, RlError> {
        self.0
            .get(k)
            .ok_or_else(|| RlError::RecordKeyError(k.to_string()))
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, RlError> {
        match self.get_or_key_error(k)? {
            RecordValue::Scalar(v) => Ok(*v),
            _ => Err(RlError::RecordValueTypeError("Scalar".to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, RlError> {
        match self.get_or_key_error(k)? {
            RecordValue::Array1(v) => Ok(v.clone()),
            _ => Err(RlError::RecordValueTypeError("Array1".to_string())),
        }
    }

    /// Gets a 2-dimensional array and its shape from the record.
    pub fn get_array2(&self, k: &str) -> Result<(Vec<f32>, [usize; 2]), RlError> {
        match self.get_or_key_error(k)? {
            RecordValue::Array2(v, s) => Ok((v.clone(), *s)),
            _ => Err(RlError::RecordValueTypeError("Array2".to_string())),
        }
    }

    /// Gets named scalars from the record.
    pub fn get_dict(&self, k: &str) -> Result<BTreeMap<String, f32>, RlError> {
        match self.get_or_key_error(k)? {
            RecordValue::Dict(v) => Ok(v.clone()),
            _ => Err(RlError::RecordValueTypeError("Dict".to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, RlError> {
        match self.get_or_key_error(k)? {
            RecordValue::String(s) => Ok(s.clone()),
            _ => Err(RlError::RecordValueTypeError("String".to_string())),
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, RecordValue);
    type IntoIter = IntoIter<String, RecordValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, RecordValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, RecordValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
