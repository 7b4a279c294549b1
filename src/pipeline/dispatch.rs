//! Routing of one instruction to its action handler.

use std::fmt;

use crate::error::{PipelineError, PipelineResult};
use crate::functions::FunctionRegistry;
use crate::types::Frame;

use super::actions;
use super::instruction::Instruction;
use super::observer::PipelineObserver;

/// Supported pipeline actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SelectColumns,
    RenameColumn,
    RemoveColumns,
    DropDuplicates,
    SetIndex,
    Transform,
    FilterRows,
    Save,
    Log,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Self::SelectColumns,
        Self::RenameColumn,
        Self::RemoveColumns,
        Self::DropDuplicates,
        Self::SetIndex,
        Self::Transform,
        Self::FilterRows,
        Self::Save,
        Self::Log,
    ];

    /// Look up an action by its config name or one of its aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "select_columns" | "filter_columns" => Self::SelectColumns,
            "rename_column" => Self::RenameColumn,
            "remove_columns" => Self::RemoveColumns,
            "drop_duplicates" => Self::DropDuplicates,
            "set_index" => Self::SetIndex,
            "transform" | "transform_column" => Self::Transform,
            "filter_rows" => Self::FilterRows,
            "save" => Self::Save,
            "log" => Self::Log,
            _ => return None,
        })
    }

    /// Canonical config name.
    pub fn name(self) -> &'static str {
        match self {
            Self::SelectColumns => "select_columns",
            Self::RenameColumn => "rename_column",
            Self::RemoveColumns => "remove_columns",
            Self::DropDuplicates => "drop_duplicates",
            Self::SetIndex => "set_index",
            Self::Transform => "transform",
            Self::FilterRows => "filter_rows",
            Self::Save => "save",
            Self::Log => "log",
        }
    }

    /// Config names accepted for this action, canonical name first.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Self::SelectColumns => &["select_columns", "filter_columns"],
            Self::Transform => &["transform", "transform_column"],
            Self::RenameColumn => &["rename_column"],
            Self::RemoveColumns => &["remove_columns"],
            Self::DropDuplicates => &["drop_duplicates"],
            Self::SetIndex => &["set_index"],
            Self::FilterRows => &["filter_rows"],
            Self::Save => &["save"],
            Self::Log => &["log"],
        }
    }

    /// Required fields. Each entry lists interchangeable field names; an instruction must carry
    /// at least one of them, and the first is the one reported when all are missing.
    pub fn required_fields(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::SelectColumns | Self::RemoveColumns | Self::DropDuplicates | Self::SetIndex => {
                &[&["columns", "column"]]
            }
            Self::RenameColumn => &[&["old", "column"], &["new", "result"]],
            Self::Transform => &[&["columns", "column"], &["script"], &["result"]],
            Self::FilterRows => &[&["condition", "script"]],
            Self::Save => &[&["fname"]],
            Self::Log => &[],
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a handler may use besides the instruction itself.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Zero-based position of the instruction in the config.
    pub step: usize,
    pub registry: &'a FunctionRegistry,
    pub observer: Option<&'a dyn PipelineObserver>,
    pub verbose: bool,
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("step", &self.step)
            .field("registry", &self.registry)
            .field("observer_set", &self.observer.is_some())
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Validate `instruction` and apply it to `frame`.
///
/// - [`PipelineError::Config`] if the instruction is not an object or has no string `action`
/// - [`PipelineError::UnknownAction`] if the action is not supported
/// - [`PipelineError::MissingField`] if a required field is absent
///
/// Otherwise returns whatever the handler returns.
pub fn apply_instruction(
    frame: Frame,
    instruction: &Instruction,
    ctx: &StepContext<'_>,
) -> PipelineResult<Frame> {
    let name = instruction.action()?;
    let action = Action::from_name(name).ok_or_else(|| PipelineError::UnknownAction {
        action: name.to_owned(),
        step: Some(ctx.step),
    })?;

    for alternatives in action.required_fields() {
        instruction.require_any(name, alternatives)?;
    }

    match action {
        Action::SelectColumns => actions::select_columns(frame, instruction, name),
        Action::RenameColumn => actions::rename_column(frame, instruction, name),
        Action::RemoveColumns => actions::remove_columns(frame, instruction, name),
        Action::DropDuplicates => actions::drop_duplicates(frame, instruction, name),
        Action::SetIndex => actions::set_index(frame, instruction, name),
        Action::Transform => actions::transform(frame, instruction, name, ctx),
        Action::FilterRows => actions::filter_rows(frame, instruction, name, ctx),
        Action::Save => actions::save(frame, instruction, name),
        Action::Log => actions::log(frame, instruction, name, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, StepContext, apply_instruction};
    use crate::error::PipelineError;
    use crate::functions::FunctionRegistry;
    use crate::pipeline::instruction::Instruction;
    use crate::types::{Column, Frame, Value};
    use serde_json::json;

    fn frame() -> Frame {
        Frame::Column(Column::new("x", vec![Value::Int64(1)]))
    }

    fn apply(instruction: serde_json::Value) -> Result<Frame, PipelineError> {
        let registry = FunctionRegistry::new();
        let ctx = StepContext {
            step: 3,
            registry: &registry,
            observer: None,
            verbose: false,
        };
        apply_instruction(frame(), &Instruction::new(instruction), &ctx)
    }

    #[test]
    fn names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_name(action.name()), Some(action));
            for alias in action.names() {
                assert_eq!(Action::from_name(alias), Some(action));
            }
        }
        assert_eq!(Action::from_name("filter_columns"), Some(Action::SelectColumns));
        assert_eq!(Action::from_name("explode"), None);
    }

    #[test]
    fn unknown_action_names_the_action_and_step() {
        let err = apply(json!({"action": "explode"})).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::UnknownAction { ref action, step: Some(3) } if action == "explode"
        ));
    }

    #[test]
    fn missing_action_is_a_config_error() {
        assert!(matches!(apply(json!({"columns": "x"})).unwrap_err(), PipelineError::Config { .. }));
        assert!(matches!(apply(json!(["log"])).unwrap_err(), PipelineError::Config { .. }));
    }

    #[test]
    fn missing_required_field_is_reported_by_name() {
        let err = apply(json!({"action": "select_columns"})).unwrap_err();
        assert!(matches!(err, PipelineError::MissingField { ref field, .. } if field == "columns"));

        let err = apply(json!({"action": "transform", "columns": "x", "result": "y"})).unwrap_err();
        assert!(matches!(err, PipelineError::MissingField { ref field, .. } if field == "script"));
    }

    #[test]
    fn routes_to_the_handler() {
        let out = apply(json!({"action": "filter_columns", "columns": ["x"]})).unwrap();
        assert!(matches!(out, Frame::Table(_)));
    }
}
