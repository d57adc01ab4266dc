#![forbid(unsafe_code)]

//! Immutable snapshot of a model's keyed values.

use std::ops::Index;

use serde_json::{Map, Value};

static NULL: Value = Value::Null;

/// The full key/value state of a [`Model`](crate::Model) at one instant.
///
/// Indexing a key that does not exist yields [`Value::Null`], so derivation
/// functions can read optional keys without unwrapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct State(Map<String, Value>);

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The value at `key` when it is a string.
    #[must_use]
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// The value at `key` when it is an integer.
    #[must_use]
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Store `value`, returning whether anything changed.
    pub(crate) fn replace(&mut self, key: &str, value: Value) -> bool {
        match self.0.get_mut(key) {
            Some(slot) if *slot == value => false,
            Some(slot) => {
                *slot = value;
                true
            }
            None => {
                self.0.insert(key.to_owned(), value);
                true
            }
        }
    }

    /// Drop `key`, returning whether it was present.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }
}

impl Index<&str> for State {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for State {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for State {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}
