use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry in a user's list. Clients supply an arbitrary JSON object;
/// every field except `done` is opaque payload and round-trips verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Item(pub Map<String, Value>);

impl Item {
    /// Accepts only JSON objects; anything else has no place to carry a
    /// `done` field later.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// A missing or non-boolean `done` counts as not done.
    pub fn done(&self) -> bool {
        self.0.get("done").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn toggle_done(&mut self) {
        let next = !self.done();
        self.0.insert("done".to_string(), Value::Bool(next));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
