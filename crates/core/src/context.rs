//! Per-call context handed to activities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Data bag for one gate call (identity plus arbitrary parameters).
///
/// Created per call and dropped once a decision is reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Map<String, Value>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The identity stored under `field`, if it is present and truthy.
    pub fn identity(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| is_truthy(v))
    }

    pub fn is_authenticated(&self, field: &str) -> bool {
        self.identity(field).is_some()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Context {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Value)> for Context {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// `null`, `false`, `0` and `""` count as "no value".
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Something that yields the context for a single gate call.
///
/// Resolved exactly once per call. A `Context` is moved in as-is; a producer
/// closure is invoked lazily.
pub trait ContextSource {
    fn resolve(self) -> Context;
}

impl ContextSource for Context {
    fn resolve(self) -> Context {
        self
    }
}

impl<F> ContextSource for F
where
    F: FnOnce() -> Context,
{
    fn resolve(self) -> Context {
        self()
    }
}
