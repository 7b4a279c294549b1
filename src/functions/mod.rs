//! Pluggable transformation and predicate functions.
//!
//! `transform` and `filter_rows` instructions name a function through a [`CallableRef`]:
//!
//! - a bare name (`"greater_than"`) resolves against the fixed [`builtins`] table
//! - a `[locator, symbol]` pair (`["plugins/text.rs", "shout"]`) resolves against the units
//!   registered on a [`FunctionRegistry`]
//!
//! Every function has the same shape: it receives the selected input [`Frame`] (a column or a
//! table) plus the instruction's positional and named arguments, and returns a new frame.

pub mod builtins;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Frame, Value};

pub use registry::{FunctionRegistry, unit_path};

/// Result type returned by transformation functions.
pub type FunctionResult<T> = Result<T, FunctionError>;

/// A resolved, invocable transformation function.
pub type TransformFn = Arc<dyn Fn(Frame, &CallArgs) -> FunctionResult<Frame> + Send + Sync>;

/// Error raised by a transformation function while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// How an instruction names its function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallableRef {
    /// Bare name looked up in the built-in table.
    Name(String),
    /// `(locator, symbol)`: a code unit path and an exported function name within it.
    Located(String, String),
}

impl fmt::Display for CallableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Located(locator, symbol) => write!(f, "'{symbol}' from '{locator}'"),
        }
    }
}

/// Positional and named arguments passed to a function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments, in order.
    pub positional: Vec<serde_json::Value>,
    /// Named arguments.
    pub named: serde_json::Map<String, serde_json::Value>,
}

impl CallArgs {
    pub fn new(
        positional: Vec<serde_json::Value>,
        named: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self { positional, named }
    }

    /// Build arguments from an instruction's optional `args` / `kwargs` fields.
    ///
    /// `args` that is not an array is treated as a single positional argument. `kwargs` must be
    /// an object when present.
    pub fn from_json(
        args: Option<&serde_json::Value>,
        kwargs: Option<&serde_json::Value>,
    ) -> Result<Self, String> {
        let positional = match args {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items.clone(),
            Some(other) => vec![other.clone()],
        };
        let named = match kwargs {
            None | Some(serde_json::Value::Null) => serde_json::Map::new(),
            Some(serde_json::Value::Object(map)) => map.clone(),
            Some(other) => return Err(format!("'kwargs' must be an object, got {other}")),
        };
        Ok(Self { positional, named })
    }

    /// Positional argument `i` as a cell value.
    pub fn value(&self, i: usize) -> Option<Value> {
        self.positional.get(i).map(Value::from_json)
    }

    /// All positional arguments as cell values.
    pub fn values(&self) -> Vec<Value> {
        self.positional.iter().map(Value::from_json).collect()
    }

    /// Named argument `key` as a cell value.
    pub fn named_value(&self, key: &str) -> Option<Value> {
        self.named.get(key).map(Value::from_json)
    }

    /// Positional argument `i`, failing if absent.
    pub fn require(&self, i: usize, function: &str) -> FunctionResult<Value> {
        self.value(i).ok_or_else(|| {
            FunctionError::new(format!(
                "{function} expects at least {} positional argument(s)",
                i + 1
            ))
        })
    }

    /// Named argument `key`, failing if absent.
    pub fn require_named(&self, key: &str, function: &str) -> FunctionResult<Value> {
        self.named_value(key)
            .ok_or_else(|| FunctionError::new(format!("{function} requires keyword argument '{key}'")))
    }
}
