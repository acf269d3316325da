//! Curriculum content of a course.
//!
//! The curriculum has no fixed schema: instructors nest sections, lectures and
//! arbitrary metadata freely. It is held as a JSON value and stored as-is, e.g.
//! in a `JSONB` column.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;

/// Free-form structured curriculum content. Defaults to `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curriculum(Value);

impl Curriculum {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns true when no curriculum has been provided.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Looks up a nested value by JSON pointer, e.g. `/sections/0/title`.
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        self.0.pointer(pointer)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

impl From<Value> for Curriculum {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Deref for Curriculum {
    type Target = Value;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
