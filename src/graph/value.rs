//! Typed handle values.
//!
//! Handle payloads are represented as a tagged union over the closed set of
//! io types, so consuming code can exhaustively match on the variant instead
//! of trusting runtime shape. JSON conversion happens only at the model
//! boundary, guided by the handle's declared [`IoType`].

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Closed set of handle data types.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IoType {
    String,
    Number,
    Boolean,
    #[default]
    Unknown,
    Document,
    References,
    /// Pure trigger input; carries no payload.
    #[serde(rename = "execute")]
    #[strum(serialize = "execute")]
    ExecuteSignal,
}

/// Runtime payload of a handle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum IoValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    /// Structured payload whose shape is owned by the worker's behavior.
    Document(Value),
    /// List of document/record ids.
    References(Vec<String>),
    /// Execute-signal marker.
    Signal,
}

impl IoValue {
    /// Boolean coercion used by conditional gating.
    pub fn is_truthy(&self) -> bool {
        match self {
            IoValue::Null => false,
            IoValue::Bool(b) => *b,
            IoValue::Number(n) => *n != 0.0,
            IoValue::String(s) => !s.is_empty(),
            IoValue::Document(v) => !v.is_null(),
            IoValue::References(refs) => !refs.is_empty(),
            IoValue::Signal => true,
        }
    }

    /// Convert a JSON payload into a typed value, guided by the handle's
    /// declared type. A payload that does not fit its declared type falls
    /// back to `Document`; `Unknown` infers the variant from the JSON shape.
    pub fn from_json(
        io_type: IoType,
        value: Value,
    ) -> Self {
        if value.is_null() {
            return IoValue::Null;
        }
        match io_type {
            IoType::String => match value {
                Value::String(s) => IoValue::String(s),
                other => IoValue::Document(other),
            },
            IoType::Number => match value.as_f64() {
                Some(n) => IoValue::Number(n),
                None => IoValue::Document(value),
            },
            IoType::Boolean => match value {
                Value::Bool(b) => IoValue::Bool(b),
                other => IoValue::Document(other),
            },
            IoType::References => match serde_json::from_value::<Vec<String>>(value.clone()) {
                Ok(refs) => IoValue::References(refs),
                Err(_) => IoValue::Document(value),
            },
            IoType::ExecuteSignal => IoValue::Signal,
            IoType::Document => IoValue::Document(value),
            IoType::Unknown => Self::infer(value),
        }
    }

    /// Infer a typed value from a JSON shape alone.
    fn infer(value: Value) -> Self {
        match value {
            Value::Null => IoValue::Null,
            Value::Bool(b) => IoValue::Bool(b),
            Value::Number(n) => n.as_f64().map(IoValue::Number).unwrap_or(IoValue::Null),
            Value::String(s) => IoValue::String(s),
            other => IoValue::Document(other),
        }
    }

    /// Convert back to a JSON payload for the model boundary.
    pub fn to_json(&self) -> Value {
        match self {
            IoValue::Null => Value::Null,
            IoValue::Bool(b) => json!(b),
            IoValue::Number(n) => json!(n),
            IoValue::String(s) => json!(s),
            IoValue::Document(v) => v.clone(),
            IoValue::References(refs) => json!(refs),
            IoValue::Signal => json!(true),
        }
    }
}
