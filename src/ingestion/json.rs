//! JSON ingestion.
//!
//! Accepted inputs:
//! - a JSON array of objects: `[{"a":1}, {"a":2}]`
//! - a single object
//! - newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Schema field names may be dot paths (`user.name`) to reach into nested objects. A field typed
//! [`DataType::Struct`] keeps the whole nested object as a [`Value::Struct`].

use std::fs;
use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// Ingest a JSON or NDJSON file into a [`DataSet`].
pub fn ingest_json_from_path(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<DataSet> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, schema)
}

/// Ingest JSON or NDJSON text into a [`DataSet`].
pub fn ingest_json_from_str(input: &str, schema: &Schema) -> IngestionResult<DataSet> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    let records = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Array(items)) => items,
        Ok(obj @ serde_json::Value::Object(_)) => vec![obj],
        Ok(_) => {
            return Err(IngestionError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            });
        }
        Err(_) => parse_ndjson(trimmed)?,
    };

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, record)| json_row(i + 1, record, schema))
        .collect::<IngestionResult<Vec<_>>>()?;
    Ok(DataSet::new(schema.clone(), rows))
}

fn parse_ndjson(text: &str) -> IngestionResult<Vec<serde_json::Value>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line.trim()).map_err(|e| IngestionError::SchemaMismatch {
                message: format!("invalid ndjson at line {}: {e}", i + 1),
            })
        })
        .collect()
}

fn json_row(row: usize, record: &serde_json::Value, schema: &Schema) -> IngestionResult<Vec<Value>> {
    let obj = record.as_object().ok_or_else(|| IngestionError::SchemaMismatch {
        message: format!("row {row} is not a json object"),
    })?;

    schema
        .fields
        .iter()
        .map(|field| {
            let raw = lookup_path(obj, &field.name).ok_or_else(|| IngestionError::SchemaMismatch {
                message: format!("row {row} missing required field '{}'", field.name),
            })?;
            convert(raw, field.data_type).map_err(|message| IngestionError::ParseError {
                row,
                column: field.name.clone(),
                raw: raw.to_string(),
                message: message.to_string(),
            })
        })
        .collect()
}

fn lookup_path<'a>(
    root: &'a serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Option<&'a serde_json::Value> {
    // An exact key wins over a dot path, so `{"a.b": 1}` stays reachable.
    if let Some(v) = root.get(path) {
        return Some(v);
    }
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn convert(v: &serde_json::Value, data_type: DataType) -> Result<Value, &'static str> {
    if v.is_null() {
        return Ok(Value::Null);
    }

    match data_type {
        DataType::Utf8 => v.as_str().map(|s| Value::Utf8(s.to_owned())).ok_or("expected string"),
        DataType::Bool => v.as_bool().map(Value::Bool).ok_or("expected bool"),
        DataType::Int64 => match (v.as_i64(), v.as_u64()) {
            (Some(n), _) => Ok(Value::Int64(n)),
            (None, Some(_)) => Err("u64 out of range for i64"),
            (None, None) => Err("expected integer number"),
        },
        DataType::Float64 => v.as_f64().map(Value::Float64).ok_or("expected number"),
        DataType::Struct => match v {
            serde_json::Value::Object(_) => Ok(Value::from_json(v)),
            _ => Err("expected object"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::ingest_json_from_str;
    use crate::types::{DataType, Field, Schema, Value};

    #[test]
    fn struct_fields_keep_nested_objects() {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("meta", DataType::Struct),
        ]);
        let ds = ingest_json_from_str(
            r#"[{"id": 1, "meta": {"b": 2, "a": "x"}}, {"id": 2, "meta": null}]"#,
            &schema,
        )
        .unwrap();
        assert_eq!(
            ds.rows[0][1],
            Value::Struct(vec![
                ("b".to_string(), Value::Int64(2)),
                ("a".to_string(), Value::Utf8("x".to_string())),
            ])
        );
        assert_eq!(ds.rows[1][1], Value::Null);
    }

    #[test]
    fn struct_field_rejects_scalars() {
        let schema = Schema::new(vec![Field::new("meta", DataType::Struct)]);
        assert!(ingest_json_from_str(r#"{"meta": 3}"#, &schema).is_err());
    }

    #[test]
    fn dotted_keys_are_found_before_paths() {
        let schema = Schema::new(vec![Field::new("a.b", DataType::Int64)]);
        let ds = ingest_json_from_str(r#"{"a.b": 7, "a": {"b": 8}}"#, &schema).unwrap();
        assert_eq!(ds.rows[0][0], Value::Int64(7));
    }
}
