//! Insertion-ordered dictionary with Python-like key semantics.
//!
//! Storage preserves insertion order (`entries`) while `buckets` accelerates
//! lookup by hash. Bucket collisions are resolved by checking key equality.

use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use rustc_hash::{FxHashMap, FxHasher};

use crate::runtime::error::OperationError;
use crate::runtime::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(Value, Value)>,
    buckets: FxHashMap<u64, Vec<usize>>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Inserts or overwrites. An existing key keeps its original position.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), OperationError> {
        let hash = hash_key(&key)?;
        if let Some(index) = self.find_index(hash, &key) {
            self.entries[index].1 = value;
            return Ok(());
        }

        let index = self.entries.len();
        self.entries.push((key, value));
        self.buckets.entry(hash).or_default().push(index);
        Ok(())
    }

    pub(crate) fn insert_str(&mut self, key: String, value: Value) {
        let key = Value::Str(key);
        let hash = hash_key(&key).unwrap_or_default();
        if let Some(index) = self.find_index(hash, &key) {
            self.entries[index].1 = value;
            return;
        }
        let index = self.entries.len();
        self.entries.push((key, value));
        self.buckets.entry(hash).or_default().push(index);
    }

    /// Looks up `key`; fails only when the key type cannot be hashed.
    pub fn get(&self, key: &Value) -> Result<Option<&Value>, OperationError> {
        let hash = hash_key(key)?;
        Ok(self
            .find_index(hash, key)
            .map(|index| &self.entries[index].1))
    }

    fn find_index(&self, hash: u64, key: &Value) -> Option<usize> {
        let indices = self.buckets.get(&hash)?;
        indices
            .iter()
            .copied()
            .find(|&index| self.entries[index].0 == *key)
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| matches!(other.get(key), Ok(Some(found)) if found == value))
    }
}

/// Hashes a key so that `1`, `1.0` and `true` land in the same bucket.
fn hash_key(key: &Value) -> Result<u64, OperationError> {
    let mut hasher = FxHasher::default();
    match key {
        Value::Int(value) => value.hash(&mut hasher),
        Value::Bool(value) => BigInt::from(u8::from(*value)).hash(&mut hasher),
        Value::Real(value) => match BigInt::from_f64(*value).filter(|_| value.fract() == 0.0) {
            Some(integral) => integral.hash(&mut hasher),
            None => value.to_bits().hash(&mut hasher),
        },
        Value::Str(value) => value.hash(&mut hasher),
        other => {
            return Err(OperationError::UnhashableKey {
                type_name: other.type_name(),
            });
        }
    }
    Ok(hasher.finish())
}
