//! Decoded value variant.
//!
//! # Responsibility
//! - Represent any value a client can store as a closed, matchable enum.
//! - Bridge to `serde_json` for encoding and decoding.
//!
//! # Invariants
//! - Map entries keep the key order they were decoded with.
//! - Conversion to and from `serde_json::Value` is lossless.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

/// Opaque structured value stored under a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum TagValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<TagValue>),
    /// String-keyed map in source order.
    Map(Vec<(String, TagValue)>),
}

impl TagValue {
    /// Builds a string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Builds a list of strings, e.g. the tag index.
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(items.into_iter().map(|item| Self::String(item.into())).collect())
    }

    /// Returns the string payload for `TagValue::String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the items for `TagValue::List`.
    pub fn as_list(&self) -> Option<&[TagValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Short variant name used in diagnostics and log lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

impl From<JsonValue> for TagValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(flag) => Self::Bool(flag),
            JsonValue::Number(number) => Self::Number(number),
            JsonValue::String(text) => Self::String(text),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(key, field)| (key, Self::from(field)))
                    .collect(),
            ),
        }
    }
}

impl From<TagValue> for JsonValue {
    fn from(value: TagValue) -> Self {
        match value {
            TagValue::Null => Self::Null,
            TagValue::Bool(flag) => Self::Bool(flag),
            TagValue::Number(number) => Self::Number(number),
            TagValue::String(text) => Self::String(text),
            TagValue::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            TagValue::Map(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, field)| (key, Self::from(field)))
                    .collect::<Map<String, JsonValue>>(),
            ),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<TagValue>> for TagValue {
    fn from(items: Vec<TagValue>) -> Self {
        Self::List(items)
    }
}
