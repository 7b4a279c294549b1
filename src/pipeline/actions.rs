//! Action handlers.
//!
//! Each handler consumes the current frame and returns the next one. Required fields have
//! already been checked by the dispatcher; handlers still decode them and report wrongly typed
//! values as [`PipelineError::Config`].

use std::path::PathBuf;

use crate::error::{PipelineError, PipelineResult};
use crate::export::{CsvWriteOptions, write_csv_to_path};
use crate::functions::{CallArgs, CallableRef};
use crate::processing::{self, align, combine, filter_mask};
use crate::types::{ColumnSpec, DataSet, Field, Frame, Schema, Value};

use super::condition::Condition;
use super::dispatch::StepContext;
use super::instruction::Instruction;
use super::observer::{FrameStats, PipelineEvent};

pub(crate) fn select_columns(frame: Frame, ins: &Instruction, action: &str) -> PipelineResult<Frame> {
    processing::select(&frame, &ins.column_spec(action)?)
}

pub(crate) fn rename_column(frame: Frame, ins: &Instruction, action: &str) -> PipelineResult<Frame> {
    let old: String = ins.require_as(action, &["old", "column"])?;
    let new: String = ins.require_as(action, &["new", "result"])?;
    processing::rename(frame, &old, &new)
}

pub(crate) fn remove_columns(frame: Frame, ins: &Instruction, action: &str) -> PipelineResult<Frame> {
    processing::remove(frame, &ins.column_spec(action)?)
}

pub(crate) fn drop_duplicates(frame: Frame, ins: &Instruction, action: &str) -> PipelineResult<Frame> {
    processing::drop_duplicates(frame, &ins.column_spec(action)?)
}

pub(crate) fn set_index(frame: Frame, ins: &Instruction, action: &str) -> PipelineResult<Frame> {
    processing::set_index(frame, &ins.column_spec(action)?)
}

/// Apply a function to the selected columns and store its output under `result`.
///
/// The output is attached by row label, so existing columns named by `result` are overwritten
/// and all other columns are left as they were. A column frame stays a column when the result
/// replaces it; adding columns widens it to a table.
pub(crate) fn transform(
    frame: Frame,
    ins: &Instruction,
    action: &str,
    ctx: &StepContext<'_>,
) -> PipelineResult<Frame> {
    let result: ColumnSpec = ins.require_as(action, &["result"])?;
    let (callable, output) = invoke(&frame, ins, action, ctx)?;
    let output = name_output(output, &result, &callable)?;
    let was_column = matches!(frame, Frame::Column(_));
    match combine(frame, output)? {
        Frame::Table(ds) if was_column => Ok(match ds.into_column() {
            Ok(col) => Frame::Column(col),
            Err(ds) => Frame::Table(ds),
        }),
        combined => Ok(combined),
    }
}

/// Keep the rows matched by `condition`.
///
/// `condition` is either an expression string (see [`Condition`]) or an object with
/// `columns`, `script`, `args` and `kwargs` naming a predicate function. A top-level
/// `columns`/`script` pair without `condition` is accepted as the predicate form.
pub(crate) fn filter_rows(
    frame: Frame,
    ins: &Instruction,
    action: &str,
    ctx: &StepContext<'_>,
) -> PipelineResult<Frame> {
    let mask = match ins.get("condition") {
        Some(serde_json::Value::String(text)) => Condition::parse(text)?.evaluate(&frame)?,
        Some(spec @ serde_json::Value::Object(_)) => {
            predicate_mask(&frame, &Instruction::new(spec.clone()), action, ctx)?
        }
        Some(other) => {
            return Err(PipelineError::config(format!(
                "'condition' for action '{action}' must be a string or an object, got {other}"
            )));
        }
        None => predicate_mask(&frame, ins, action, ctx)?,
    };
    filter_mask(frame, &mask)
}

/// Write the frame to `fname` and pass it on unchanged.
pub(crate) fn save(frame: Frame, ins: &Instruction, action: &str) -> PipelineResult<Frame> {
    let path: PathBuf = ins.require_as(action, &["fname"])?;
    let options = save_options(&frame, &ins.call_args()?)?;
    write_csv_to_path(&frame, &path, &options)?;
    Ok(frame)
}

/// Report the current shape, and `message` if given, without touching the frame.
pub(crate) fn log(
    frame: Frame,
    ins: &Instruction,
    action: &str,
    ctx: &StepContext<'_>,
) -> PipelineResult<Frame> {
    let message: Option<String> = ins.optional_as(action, "message")?;
    let event = PipelineEvent::Logged {
        step: ctx.step,
        message,
        columns: frame.column_names(),
        stats: FrameStats::of(&frame),
    };
    if let Some(observer) = ctx.observer {
        observer.on_event(&event);
    }
    if ctx.verbose {
        eprintln!("[pipeline] {event}");
    }
    Ok(frame)
}

/// Resolve the instruction's callable and run it on the selected columns.
fn invoke(
    frame: &Frame,
    ins: &Instruction,
    action: &str,
    ctx: &StepContext<'_>,
) -> PipelineResult<(CallableRef, Frame)> {
    let columns = ins.column_spec(action)?;
    let callable = ins.callable(action)?;
    let args = ins.call_args()?;
    let function = ctx.registry.resolve(&callable)?;

    let input = processing::select(frame, &columns)?;
    let output = function(input, &args).map_err(|e| PipelineError::Execution {
        callable: callable.to_string(),
        message: e.to_string(),
    })?;
    Ok((callable, output))
}

fn predicate_mask(
    frame: &Frame,
    spec: &Instruction,
    action: &str,
    ctx: &StepContext<'_>,
) -> PipelineResult<Vec<bool>> {
    let (callable, output) = invoke(frame, spec, action, ctx)?;
    let execution = |message: String| PipelineError::Execution {
        callable: callable.to_string(),
        message,
    };

    let mask = match output {
        Frame::Column(mask) => mask,
        Frame::Table(ds) => {
            return Err(execution(format!(
                "predicate must return a single boolean column, got a table with {} columns",
                ds.column_count()
            )));
        }
    };

    let positions = align(frame.index(), &mask.index)?;
    positions
        .iter()
        .zip(&frame.index().labels)
        .map(|(position, label)| match position.and_then(|p| mask.values.get(p)) {
            Some(Value::Bool(keep)) => Ok(*keep),
            Some(other) => Err(execution(format!(
                "predicate returned non-boolean value {other:?} for row {label:?}"
            ))),
            None => Err(PipelineError::Alignment {
                message: format!("predicate returned no value for row {label:?}"),
            }),
        })
        .collect()
}

/// Give a function's output the column names requested by `result`.
fn name_output(output: Frame, result: &ColumnSpec, callable: &CallableRef) -> PipelineResult<Frame> {
    match (output, result) {
        (Frame::Column(mut col), ColumnSpec::Single(label)) => {
            col.field.name = label.clone();
            Ok(Frame::Column(col))
        }
        (Frame::Column(mut col), ColumnSpec::Many(labels)) if labels.len() == 1 => {
            col.field.name = labels[0].clone();
            Ok(Frame::Column(col))
        }
        (Frame::Table(ds), ColumnSpec::Single(prefix)) => {
            let fields = ds
                .schema
                .fields
                .into_iter()
                .map(|f| Field::new(format!("{prefix}.{}", f.name), f.data_type))
                .collect();
            Ok(Frame::Table(DataSet {
                schema: Schema::new(fields),
                ..ds
            }))
        }
        (Frame::Table(ds), ColumnSpec::Many(labels)) if labels.len() == ds.column_count() => {
            let fields = ds
                .schema
                .fields
                .into_iter()
                .zip(labels)
                .map(|(f, label)| Field::new(label.clone(), f.data_type))
                .collect();
            Ok(Frame::Table(DataSet {
                schema: Schema::new(fields),
                ..ds
            }))
        }
        (output, result) => Err(PipelineError::Execution {
            callable: callable.to_string(),
            message: format!(
                "returned a {} with {} column(s), which cannot be stored as {:?}",
                output.shape_name(),
                output.column_count(),
                result.labels()
            ),
        }),
    }
}

/// CSV options from `save`'s arguments: `args[0]` or `sep`/`delimiter` for the delimiter,
/// `header` and `index` as booleans.
fn save_options(frame: &Frame, args: &CallArgs) -> PipelineResult<CsvWriteOptions> {
    let mut options = CsvWriteOptions::for_frame(frame);

    if let Some(delimiter) = args.positional.first() {
        options.delimiter = delimiter_byte(delimiter)?;
    }
    for (key, value) in &args.named {
        match key.as_str() {
            "sep" | "delimiter" => options.delimiter = delimiter_byte(value)?,
            "header" => options.has_header = bool_option(key, value)?,
            "index" => options.include_index = bool_option(key, value)?,
            other => {
                return Err(PipelineError::config(format!(
                    "unsupported save option '{other}' (expected sep, delimiter, header or index)"
                )));
            }
        }
    }
    Ok(options)
}

fn delimiter_byte(value: &serde_json::Value) -> PipelineResult<u8> {
    match value.as_str().map(str::as_bytes) {
        Some([byte]) => Ok(*byte),
        _ => Err(PipelineError::config(format!(
            "save delimiter must be a single ASCII character, got {value}"
        ))),
    }
}

fn bool_option(key: &str, value: &serde_json::Value) -> PipelineResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| PipelineError::config(format!("save option '{key}' must be a boolean, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::{name_output, save_options, transform};
    use crate::error::PipelineError;
    use crate::functions::{CallArgs, CallableRef, FunctionRegistry};
    use crate::pipeline::dispatch::StepContext;
    use crate::pipeline::instruction::Instruction;
    use crate::processing::set_index;
    use crate::types::{Column, ColumnSpec, DataSet, DataType, Field, Frame, Schema, Value};
    use serde_json::json;

    fn callable() -> CallableRef {
        CallableRef::Name("f".to_string())
    }

    fn pair() -> Frame {
        Frame::Table(DataSet::new(
            Schema::new(vec![
                Field::new("a", DataType::Int64),
                Field::new("b", DataType::Int64),
            ]),
            vec![vec![Value::Int64(1), Value::Int64(2)]],
        ))
    }

    #[test]
    fn column_output_takes_result_label() {
        let col = Frame::Column(Column::new("x", vec![Value::Int64(1)]));
        let out = name_output(col.clone(), &ColumnSpec::from("y"), &callable()).unwrap();
        assert_eq!(out.column_names(), vec!["y"]);
        let out = name_output(col, &ColumnSpec::from(vec!["z"]), &callable()).unwrap();
        assert_eq!(out.column_names(), vec!["z"]);
    }

    #[test]
    fn table_output_is_prefixed_or_renamed() {
        let out = name_output(pair(), &ColumnSpec::from("meta"), &callable()).unwrap();
        assert_eq!(out.column_names(), vec!["meta.a", "meta.b"]);
        let out = name_output(pair(), &ColumnSpec::from(vec!["p", "q"]), &callable()).unwrap();
        assert_eq!(out.column_names(), vec!["p", "q"]);
    }

    #[test]
    fn mismatched_result_width_is_an_execution_error() {
        let err = name_output(pair(), &ColumnSpec::from(vec!["p"]), &callable()).unwrap_err();
        assert!(matches!(err, PipelineError::Execution { .. }));
        let col = Frame::Column(Column::new("x", vec![Value::Int64(1)]));
        let err = name_output(col, &ColumnSpec::from(vec!["p", "q"]), &callable()).unwrap_err();
        assert!(matches!(err, PipelineError::Execution { .. }));
    }

    fn run_transform(frame: Frame, result: serde_json::Value) -> Frame {
        let registry = FunctionRegistry::new();
        let ctx = StepContext {
            step: 0,
            registry: &registry,
            observer: None,
            verbose: false,
        };
        let ins = Instruction::new(json!({
            "action": "transform",
            "columns": "n",
            "script": "greater_than",
            "args": 1,
            "result": result
        }));
        transform(frame, &ins, "transform", &ctx).unwrap()
    }

    #[test]
    fn transform_keeps_column_shape_when_overwriting() {
        let col = Frame::Column(Column::new("n", vec![Value::Int64(1), Value::Int64(2)]));

        let out = run_transform(col.clone(), json!("n"));
        match out {
            Frame::Column(c) => {
                assert_eq!(c.name(), "n");
                assert_eq!(c.values, vec![Value::Bool(false), Value::Bool(true)]);
            }
            Frame::Table(_) => panic!("expected a column"),
        }

        let out = run_transform(col, json!("big"));
        assert!(matches!(out, Frame::Table(ref ds) if ds.schema.names() == vec!["n", "big"]));
    }

    #[test]
    fn save_options_from_args() {
        let args = CallArgs::from_json(Some(&json!(";")), Some(&json!({"header": false}))).unwrap();
        let options = save_options(&pair(), &args).unwrap();
        assert_eq!(options.delimiter, b';');
        assert!(!options.has_header);
        assert!(!options.include_index);

        let indexed = set_index(pair(), &ColumnSpec::from("a")).unwrap();
        let options = save_options(&indexed, &CallArgs::default()).unwrap();
        assert!(options.include_index);

        let args = CallArgs::from_json(None, Some(&json!({"sep": "\t", "index": false}))).unwrap();
        let options = save_options(&indexed, &args).unwrap();
        assert_eq!(options.delimiter, b'\t');
        assert!(!options.include_index);
    }

    #[test]
    fn bad_save_options_are_config_errors() {
        for kwargs in [json!({"sep": ";;"}), json!({"header": "yes"}), json!({"encoding": "utf-8"})] {
            let args = CallArgs::from_json(None, Some(&kwargs)).unwrap();
            assert!(matches!(
                save_options(&pair(), &args).unwrap_err(),
                PipelineError::Config { .. }
            ));
        }
    }
}
