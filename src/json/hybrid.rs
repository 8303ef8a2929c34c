//! Eager generic JSON tree.
//!
//! The hybrid parser shares the grammar of [`super::parser`] but converts
//! numbers right away: integral text becomes `i64`, text containing `.`, `e`
//! or `E` becomes `f64`. Strings stay as read, even when they hold dates,
//! guids or base64. Useful for inspecting documents of unknown shape.

use indexmap::IndexMap;

use super::parser::{Parser, TreeSink};
use crate::error::{JsonError, JsonResult};

/// A node of the eager tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Generic {
    /// JSON null.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integral number.
    Integer(i64),
    /// Number with a fraction or exponent.
    Float(f64),
    /// String.
    String(String),
    /// Array.
    List(Vec<Generic>),
    /// Object, keys in first-seen order.
    Map(IndexMap<String, Generic>),
}

impl Generic {
    /// Returns true if this is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Generic::Null)
    }

    /// Returns the integer if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Generic::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as `f64` for both numeric variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Generic::Integer(n) => Some(*n as f64),
            Generic::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Generic::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get a map entry by key.
    pub fn get(&self, key: &str) -> Option<&Generic> {
        match self {
            Generic::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Get a list element by index.
    pub fn get_index(&self, index: usize) -> Option<&Generic> {
        match self {
            Generic::List(list) => list.get(index),
            _ => None,
        }
    }
}

impl From<Generic> for serde_json::Value {
    fn from(value: Generic) -> Self {
        match value {
            Generic::Null => serde_json::Value::Null,
            Generic::Bool(b) => serde_json::Value::Bool(b),
            Generic::Integer(n) => serde_json::Value::from(n),
            Generic::Float(n) => serde_json::Number::from_f64(n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Generic::String(s) => serde_json::Value::String(s),
            Generic::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Generic::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Sink converting scalars eagerly.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSink;

impl TreeSink for GenericSink {
    type Node = Generic;

    fn null(&mut self) -> Generic {
        Generic::Null
    }

    fn boolean(&mut self, value: bool) -> Generic {
        Generic::Bool(value)
    }

    fn string(&mut self, value: String) -> Generic {
        Generic::String(value)
    }

    fn number(&mut self, span: &str) -> JsonResult<Generic> {
        if span.contains(['.', 'e', 'E']) {
            span.parse::<f64>()
                .map(Generic::Float)
                .map_err(|_| JsonError::InvalidNumericFormat {
                    text: span.to_string(),
                    target: "f64",
                })
        } else {
            span.parse::<i64>()
                .map(Generic::Integer)
                .map_err(|_| JsonError::InvalidNumericFormat {
                    text: span.to_string(),
                    target: "i64",
                })
        }
    }

    fn array(&mut self, items: Vec<Generic>) -> Generic {
        Generic::List(items)
    }

    fn object(&mut self, members: IndexMap<String, Generic>) -> Generic {
        Generic::Map(members)
    }
}

/// Parse text into the eager tree.
pub fn parse_generic(input: &str) -> JsonResult<Generic> {
    Parser::new(input, GenericSink).parse()
}
