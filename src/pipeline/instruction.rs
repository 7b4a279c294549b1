//! Instructions and pipeline configs.
//!
//! An instruction is a JSON object with a string `action` field plus action-specific fields. It
//! is kept as raw JSON so that unknown fields survive, verbose output can show it exactly as
//! written, and field errors can be reported per action rather than as one serde message.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::functions::{CallArgs, CallableRef};
use crate::types::ColumnSpec;

/// One step of a pipeline config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instruction(serde_json::Value);

impl Instruction {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// The instruction exactly as it appeared in the config.
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    /// The `action` name.
    ///
    /// Fails with [`PipelineError::Config`] if the instruction is not an object, or `action`
    /// is absent or not a string.
    pub fn action(&self) -> PipelineResult<&str> {
        match self.fields()?.get("action") {
            Some(serde_json::Value::String(name)) => Ok(name),
            Some(other) => Err(PipelineError::config(format!(
                "'action' must be a string, got {other}"
            ))),
            None => Err(PipelineError::config("instruction has no 'action' field")),
        }
    }

    /// The `action` name if present and well-formed; used for diagnostics.
    pub fn action_name(&self) -> Option<&str> {
        self.0.get("action").and_then(serde_json::Value::as_str)
    }

    /// Field `key`, treating an explicit `null` as absent.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The first present field among `keys`.
    ///
    /// Fails with [`PipelineError::MissingField`] naming `keys[0]` if none is present.
    pub fn require_any(&self, action: &str, keys: &[&str]) -> PipelineResult<&serde_json::Value> {
        keys.iter()
            .find_map(|key| self.get(key))
            .ok_or_else(|| PipelineError::MissingField {
                action: action.to_owned(),
                field: keys.first().copied().unwrap_or_default().to_owned(),
            })
    }

    /// Deserialize the first present field among `keys` into `T`.
    pub fn require_as<T: DeserializeOwned>(&self, action: &str, keys: &[&str]) -> PipelineResult<T> {
        let value = self.require_any(action, keys)?;
        decode(action, keys.first().copied().unwrap_or_default(), value)
    }

    /// Deserialize optional field `key` into `T`.
    pub fn optional_as<T: DeserializeOwned>(&self, action: &str, key: &str) -> PipelineResult<Option<T>> {
        self.get(key).map(|v| decode(action, key, v)).transpose()
    }

    /// The `columns` (or `column`) selection.
    pub fn column_spec(&self, action: &str) -> PipelineResult<ColumnSpec> {
        self.require_as(action, &["columns", "column"])
    }

    /// The `script` callable reference.
    pub fn callable(&self, action: &str) -> PipelineResult<CallableRef> {
        self.require_as(action, &["script"])
    }

    /// The `args` / `kwargs` call arguments.
    pub fn call_args(&self) -> PipelineResult<CallArgs> {
        CallArgs::from_json(self.get("args"), self.get("kwargs")).map_err(PipelineError::config)
    }

    fn fields(&self) -> PipelineResult<&serde_json::Map<String, serde_json::Value>> {
        self.0.as_object().ok_or_else(|| {
            PipelineError::config(format!("instruction must be a JSON object, got {}", self.0))
        })
    }
}

impl From<serde_json::Value> for Instruction {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

fn decode<T: DeserializeOwned>(action: &str, key: &str, value: &serde_json::Value) -> PipelineResult<T> {
    T::deserialize(value).map_err(|e| {
        PipelineError::config(format!("invalid '{key}' for action '{action}': {e}"))
    })
}

/// An ordered sequence of instructions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PipelineConfig {
    instructions: Vec<Instruction>,
}

impl PipelineConfig {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Build a config from an already decoded JSON document.
    ///
    /// Fails with [`PipelineError::Config`] unless the document is an array.
    pub fn from_json_value(value: serde_json::Value) -> PipelineResult<Self> {
        match value {
            serde_json::Value::Array(items) => {
                Ok(Self::new(items.into_iter().map(Instruction::new).collect()))
            }
            other => Err(PipelineError::config(format!(
                "pipeline config must be a JSON array of instructions, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Decode a config from JSON text.
    pub fn from_json_str(text: &str) -> PipelineResult<Self> {
        Self::from_json_value(serde_json::from_str(text)?)
    }

    /// Read and decode a config file.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
}

impl<'de> Deserialize<'de> for PipelineConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json_value(value).map_err(serde::de::Error::custom)
    }
}

impl From<Vec<serde_json::Value>> for PipelineConfig {
    fn from(items: Vec<serde_json::Value>) -> Self {
        Self::new(items.into_iter().map(Instruction::new).collect())
    }
}

impl<'a> IntoIterator for &'a PipelineConfig {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.iter()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{Instruction, PipelineConfig};
    use crate::error::PipelineError;
    use crate::functions::CallableRef;
    use crate::types::ColumnSpec;
    use serde_json::json;

    #[test]
    fn action_must_be_a_string_field_of_an_object() {
        assert_eq!(Instruction::new(json!({"action": "log"})).action().unwrap(), "log");
        for bad in [json!({"columns": "x"}), json!({"action": 3}), json!("log")] {
            let err = Instruction::new(bad).action().unwrap_err();
            assert!(matches!(err, PipelineError::Config { .. }), "{err}");
        }
    }

    #[test]
    fn column_spec_accepts_columns_or_column() {
        let many = Instruction::new(json!({"columns": ["y", "x"]}));
        assert_eq!(many.column_spec("select_columns").unwrap(), ColumnSpec::from(vec!["y", "x"]));

        let single = Instruction::new(json!({"column": "x"}));
        assert_eq!(single.column_spec("set_index").unwrap(), ColumnSpec::from("x"));

        let err = Instruction::new(json!({})).column_spec("select_columns").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingField { ref field, .. } if field == "columns"
        ));
    }

    #[test]
    fn wrongly_typed_fields_are_config_errors() {
        let err = Instruction::new(json!({"columns": 5}))
            .column_spec("select_columns")
            .unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn callable_and_args() {
        let instruction = Instruction::new(json!({
            "script": ["transformations.py", "greater_than"],
            "args": 5,
        }));
        assert_eq!(
            instruction.callable("filter_rows").unwrap(),
            CallableRef::Located("transformations.py".to_string(), "greater_than".to_string())
        );
        assert_eq!(instruction.call_args().unwrap().positional, vec![json!(5)]);
    }

    #[test]
    fn config_must_be_an_array() {
        let config = PipelineConfig::from_json_str(r#"[{"action": "log"}]"#).unwrap();
        assert_eq!(config.len(), 1);

        let err = PipelineConfig::from_json_str(r#"{"action": "log"}"#).unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));

        let err = PipelineConfig::from_json_str("[{").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse(_)));
    }
}
