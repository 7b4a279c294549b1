//! Built-in transformation and predicate functions.
//!
//! All functions except [`explode_dictionary`] work cell by cell on every column of their
//! input, so a column input yields a column and a table input yields a table with the same
//! column names. Row labels are carried through unchanged, which lets the pipeline re-attach
//! the output to the dataset it came from.
//!
//! | name | arguments | output |
//! |---|---|---|
//! | `sanitize_text` | none | lower-cased ASCII text; null becomes `""` |
//! | `text_contains_any` | `*words` | `true` if any word is a substring |
//! | `text_contains_all` | `*words` | `true` if every word is a substring |
//! | `is_equal` | `value` | `true` if the cell equals `value` |
//! | `contains` | `*values` | `true` if the cell is one of `values` |
//! | `notnull` | none | `true` if the cell is not null |
//! | `between` | `min=`, `max=` | `true` if `min < cell < max` |
//! | `greater_than` | `value` | `true` if `cell > value` |
//! | `explode_dictionary` | none | one column per struct key |

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::types::{Column, DataSet, DataType, Field, Frame, Schema, Value};

use super::{CallArgs, FunctionError, FunctionResult, TransformFn};

/// Unit name under which the built-in table is reachable by `(locator, symbol)`.
pub const BUILTIN_UNIT: &str = "transformations";

type Builtin = fn(Frame, &CallArgs) -> FunctionResult<Frame>;

const BUILTINS: [(&str, Builtin); 9] = [
    ("sanitize_text", sanitize_text),
    ("text_contains_any", text_contains_any),
    ("text_contains_all", text_contains_all),
    ("is_equal", is_equal),
    ("contains", contains),
    ("notnull", notnull),
    ("between", between),
    ("greater_than", greater_than),
    ("explode_dictionary", explode_dictionary),
];

static TABLE: LazyLock<HashMap<&'static str, TransformFn>> = LazyLock::new(|| {
    BUILTINS
        .iter()
        .map(|&(name, f)| (name, Arc::new(f) as TransformFn))
        .collect()
});

/// Look up a built-in function by name.
pub fn lookup(name: &str) -> Option<TransformFn> {
    TABLE.get(name).cloned()
}

/// Names of all built-in functions, in table order.
pub fn names() -> Vec<&'static str> {
    BUILTINS.iter().map(|(name, _)| *name).collect()
}

/// Null to `""`, lower-case, then transliterate to ASCII (which strips diacritics).
pub fn sanitize_text(input: Frame, _args: &CallArgs) -> FunctionResult<Frame> {
    map_cells(input, DataType::Utf8, |v| match v {
        Value::Null => Ok(Value::Utf8(String::new())),
        Value::Utf8(s) => Ok(Value::Utf8(deunicode::deunicode(&s.to_lowercase()))),
        other => Err(FunctionError::new(format!(
            "sanitize_text expects text, got {other:?}"
        ))),
    })
}

/// `true` where the text contains at least one of the positional words.
pub fn text_contains_any(input: Frame, args: &CallArgs) -> FunctionResult<Frame> {
    let words = text_args(args, "text_contains_any")?;
    map_cells(input, DataType::Bool, |v| {
        Ok(Value::Bool(
            v.as_str()
                .is_some_and(|s| words.iter().any(|w| s.contains(w.as_str()))),
        ))
    })
}

/// `true` where the text contains every one of the positional words.
pub fn text_contains_all(input: Frame, args: &CallArgs) -> FunctionResult<Frame> {
    let words = text_args(args, "text_contains_all")?;
    map_cells(input, DataType::Bool, |v| {
        Ok(Value::Bool(
            v.as_str()
                .is_some_and(|s| words.iter().all(|w| s.contains(w.as_str()))),
        ))
    })
}

/// `true` where the cell equals the first positional argument.
pub fn is_equal(input: Frame, args: &CallArgs) -> FunctionResult<Frame> {
    let target = args.require(0, "is_equal")?;
    map_cells(input, DataType::Bool, |v| Ok(Value::Bool(v.loose_eq(&target))))
}

/// `true` where the cell is one of the positional arguments.
pub fn contains(input: Frame, args: &CallArgs) -> FunctionResult<Frame> {
    let members = args.values();
    map_cells(input, DataType::Bool, |v| {
        Ok(Value::Bool(members.iter().any(|m| v.loose_eq(m))))
    })
}

/// `true` where the cell is not null.
pub fn notnull(input: Frame, _args: &CallArgs) -> FunctionResult<Frame> {
    map_cells(input, DataType::Bool, |v| Ok(Value::Bool(!v.is_null())))
}

/// `true` where `min < cell < max`, both bounds exclusive.
pub fn between(input: Frame, args: &CallArgs) -> FunctionResult<Frame> {
    let min = args.require_named("min", "between")?;
    let max = args.require_named("max", "between")?;
    map_cells(input, DataType::Bool, |v| {
        Ok(Value::Bool(
            v.compare(&min) == Some(Ordering::Greater) && v.compare(&max) == Some(Ordering::Less),
        ))
    })
}

/// `true` where the cell is greater than the first positional argument.
pub fn greater_than(input: Frame, args: &CallArgs) -> FunctionResult<Frame> {
    let bound = args.require(0, "greater_than")?;
    map_cells(input, DataType::Bool, |v| {
        Ok(Value::Bool(v.compare(&bound) == Some(Ordering::Greater)))
    })
}

/// Spread a column of struct values into a table with one column per key.
///
/// Columns appear in the order keys are first seen. Rows that lack a key, or are null, get
/// [`Value::Null`] in that column.
pub fn explode_dictionary(input: Frame, _args: &CallArgs) -> FunctionResult<Frame> {
    let Frame::Column(col) = input else {
        return Err(FunctionError::new(
            "explode_dictionary expects a single column, got a table",
        ));
    };

    let mut keys: Vec<String> = Vec::new();
    for v in &col.values {
        match v {
            Value::Struct(fields) => {
                for (key, _) in fields {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
            }
            Value::Null => {}
            other => {
                return Err(FunctionError::new(format!(
                    "explode_dictionary expects struct values in '{}', got {other:?}",
                    col.name()
                )));
            }
        }
    }

    let rows: Vec<Vec<Value>> = col
        .values
        .into_iter()
        .map(|v| {
            let mut fields = match v {
                Value::Struct(fields) => fields,
                _ => Vec::new(),
            };
            keys.iter()
                .map(|key| {
                    fields
                        .iter()
                        .position(|(k, _)| k == key)
                        .map(|i| fields.swap_remove(i).1)
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let fields = keys
        .into_iter()
        .enumerate()
        .map(|(i, key)| Field::new(key, DataType::infer(rows.iter().filter_map(|r| r.get(i)))))
        .collect();

    Ok(Frame::Table(DataSet::with_index(
        Schema::new(fields),
        rows,
        col.index,
    )))
}

fn text_args(args: &CallArgs, function: &str) -> FunctionResult<Vec<String>> {
    args.values()
        .into_iter()
        .map(|v| match v {
            Value::Utf8(s) => Ok(s),
            other => Err(FunctionError::new(format!(
                "{function} expects text arguments, got {other:?}"
            ))),
        })
        .collect()
}

/// Apply `f` to every cell, typing every output column as `data_type`.
fn map_cells<F>(input: Frame, data_type: DataType, mut f: F) -> FunctionResult<Frame>
where
    F: FnMut(&Value) -> FunctionResult<Value>,
{
    match input {
        Frame::Column(col) => {
            let values = col.values.iter().map(&mut f).collect::<FunctionResult<Vec<_>>>()?;
            Ok(Frame::Column(Column {
                field: Field::new(col.field.name, data_type),
                values,
                index: col.index,
            }))
        }
        Frame::Table(ds) => {
            let rows = ds
                .rows
                .iter()
                .map(|row| row.iter().map(&mut f).collect::<FunctionResult<Vec<_>>>())
                .collect::<FunctionResult<Vec<_>>>()?;
            let fields = ds
                .schema
                .fields
                .into_iter()
                .map(|field| Field::new(field.name, data_type))
                .collect();
            Ok(Frame::Table(DataSet::with_index(
                Schema::new(fields),
                rows,
                ds.index,
            )))
        }
    }
}
