//! CSV ingestion.

use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// Ingest a CSV file into a [`DataSet`].
///
/// - The file must have a header row.
/// - Headers must contain every schema field; order may differ and extra columns are ignored.
/// - Cells are parsed according to the field type. Empty cells become [`Value::Null`].
/// - [`DataType::Struct`] cells hold JSON object text, as written by `save`.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV text with a header row.
pub fn ingest_csv_from_str(input: &str, schema: &Schema) -> IngestionResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> IngestionResult<DataSet> {
    let headers = rdr.headers()?.clone();

    let positions = schema
        .fields
        .iter()
        .map(|field| {
            headers
                .iter()
                .position(|h| h == field.name)
                .ok_or_else(|| IngestionError::SchemaMismatch {
                    message: format!(
                        "missing required column '{}'. headers={:?}",
                        field.name,
                        headers.iter().collect::<Vec<_>>()
                    ),
                })
        })
        .collect::<IngestionResult<Vec<usize>>>()?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // 1-based, and the header is line 1.
        let line = i + 2;
        let record = result?;

        let row = schema
            .fields
            .iter()
            .zip(&positions)
            .map(|(field, &pos)| {
                let raw = record.get(pos).unwrap_or("");
                parse_cell(raw, field.data_type).map_err(|message| IngestionError::ParseError {
                    row: line,
                    column: field.name.clone(),
                    raw: raw.to_owned(),
                    message,
                })
            })
            .collect::<IngestionResult<Vec<Value>>>()?;
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

fn parse_cell(raw: &str, data_type: DataType) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed.parse().map(Value::Int64).map_err(|e| format!("{e}")),
        DataType::Float64 => trimmed.parse().map(Value::Float64).map_err(|e| format!("{e}")),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
        DataType::Struct => match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(v @ serde_json::Value::Object(_)) => Ok(Value::from_json(&v)),
            Ok(_) => Err("expected a json object".to_string()),
            Err(e) => Err(e.to_string()),
        },
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}
