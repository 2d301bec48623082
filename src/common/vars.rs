//! Untyped key-value variables backed by a JSON object.
//!
//! Used for worker parameters, behavior scratch values and the parameter
//! object threaded through an execution pass.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// An ordered JSON object wrapper with typed accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Vars(Map<String, Value>);

impl Vars {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Get a value by key, deserialized into the requested type.
    /// Returns `None` when the key is absent or the type does not match.
    pub fn get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        self.0.get(key).and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Set a value by key; non-serializable values are stored as null.
    pub fn set<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) {
        self.0.insert(key.into(), serde_json::to_value(value).unwrap_or(Value::Null));
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Vars {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.0)
    }
}
