//! Core data model types.
//!
//! Pipelines thread a [`Frame`] from step to step. A frame has one of two shapes:
//!
//! - [`Frame::Table`]: a [`DataSet`] of zero or more named, typed columns
//! - [`Frame::Column`]: a single named [`Column`]
//!
//! Both shapes carry a [`RowIndex`] holding one label tuple per row. Row labels survive row
//! removal, which is what lets the output of a transformation be re-attached to the dataset it
//! was computed from.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Nested record of named values (e.g. a JSON object).
    Struct,
}

impl DataType {
    /// Infer a column type from its values: the type of the first non-null value, `Utf8` if
    /// every value is null.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        values
            .into_iter()
            .find_map(Value::data_type)
            .unwrap_or(Self::Utf8)
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Owned list of field names, used for error reporting.
    pub fn names(&self) -> Vec<String> {
        self.field_names().map(str::to_owned).collect()
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Missing/empty value.
    #[default]
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Ordered list of named values.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// The [`DataType`] of this value, or `None` for [`Value::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Self::Null => None,
            Self::Int64(_) => Some(DataType::Int64),
            Self::Float64(_) => Some(DataType::Float64),
            Self::Bool(_) => Some(DataType::Bool),
            Self::Utf8(_) => Some(DataType::Utf8),
            Self::Struct(_) => Some(DataType::Struct),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare two values.
    ///
    /// Integers and floats compare numerically with each other; strings, booleans and structs
    /// only compare within their own type. Returns `None` when either side is null or the types
    /// are not comparable.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int64(a), Self::Int64(b)) => Some(a.cmp(b)),
            (Self::Utf8(a), Self::Utf8(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Struct(a), Self::Struct(b)) if a == b => Some(Ordering::Equal),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Equality used by predicates: numeric values compare across integer/float, and null is
    /// never equal to anything (including null).
    pub fn loose_eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }

    /// Hashable identity of this value, used for duplicate detection and label alignment.
    ///
    /// Unlike [`Value::loose_eq`], keys are type-strict (`Int64(1)` and `Float64(1.0)` differ)
    /// and all nulls share one key.
    pub fn key(&self) -> ValueKey {
        match self {
            Self::Null => ValueKey::Null,
            Self::Int64(v) => ValueKey::Int64(*v),
            Self::Float64(v) => ValueKey::Float64(canonical_bits(*v)),
            Self::Bool(v) => ValueKey::Bool(*v),
            Self::Utf8(s) => ValueKey::Utf8(s.clone()),
            Self::Struct(fields) => ValueKey::Struct(
                fields
                    .iter()
                    .map(|(name, v)| (name.clone(), v.key()))
                    .collect(),
            ),
        }
    }

    /// Convert a JSON value (e.g. an instruction argument) into a cell value.
    ///
    /// Integral numbers become `Int64`, other numbers `Float64`, objects `Struct` (keys in
    /// document order). Arrays have no cell representation and are kept as their JSON text.
    pub fn from_json(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int64(i),
                None => n.as_f64().map(Self::Float64).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::Utf8(s.clone()),
            serde_json::Value::Object(map) => Self::Struct(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
            serde_json::Value::Array(_) => Self::Utf8(v.to_string()),
        }
    }

    /// Convert this value into JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Int64(v) => serde_json::Value::from(*v),
            Self::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(v) => serde_json::Value::Bool(*v),
            Self::Utf8(s) => serde_json::Value::String(s.clone()),
            Self::Struct(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Renders a value the way it is written to delimited text: null is empty, structs are compact
/// JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
            Self::Struct(_) => write!(f, "{}", self.to_json()),
        }
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Hashable, type-strict identity of a [`Value`]. See [`Value::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Int64(i64),
    Float64(u64),
    Bool(bool),
    Utf8(String),
    Struct(Vec<(String, ValueKey)>),
}

/// Row labels of a [`DataSet`] or [`Column`].
///
/// The default index is positional: it has no named fields and labels row `i` with
/// `Int64(i)` at construction time. After [`crate::processing::set_index`] the labels are the
/// values of the promoted columns, and `fields` describes them.
#[derive(Debug, Clone, PartialEq)]
pub struct RowIndex {
    /// Index levels promoted from data columns; empty for the positional index.
    pub fields: Vec<Field>,
    /// One label tuple per row.
    pub labels: Vec<Vec<Value>>,
}

impl RowIndex {
    /// Positional labels `0..row_count`.
    pub fn positional(row_count: usize) -> Self {
        Self {
            fields: Vec::new(),
            labels: (0..row_count as i64).map(|i| vec![Value::Int64(i)]).collect(),
        }
    }

    /// Returns `true` for the default (unnamed) index.
    pub fn is_positional(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Hashable key of the label at `row`.
    pub fn key(&self, row: usize) -> Vec<ValueKey> {
        self.labels
            .get(row)
            .map(|label| label.iter().map(Value::key).collect())
            .unwrap_or_default()
    }

    /// Keep only the labels whose position has `keep[i] == true`.
    pub fn retain_mask(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.labels
            .retain(|_| flags.next().copied().unwrap_or(false));
    }
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
    /// Row labels; always the same length as `rows`.
    pub index: RowIndex,
}

impl DataSet {
    /// Create a dataset from schema and rows, with a positional index.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        let index = RowIndex::positional(rows.len());
        Self {
            schema,
            rows,
            index,
        }
    }

    /// Create a dataset with explicit row labels.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not have one label per row.
    pub fn with_index(schema: Schema, rows: Vec<Vec<Value>>, index: RowIndex) -> Self {
        assert!(
            index.len() == rows.len(),
            "index length {} does not match row count {}",
            index.len(),
            rows.len()
        );
        Self {
            schema,
            rows,
            index,
        }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of data columns (index levels excluded).
    pub fn column_count(&self) -> usize {
        self.schema.fields.len()
    }

    /// Copy out a single column by name.
    pub fn column(&self, name: &str) -> Option<Column> {
        let idx = self.schema.index_of(name)?;
        let values = self
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or_default())
            .collect();
        Some(Column {
            field: self.schema.fields[idx].clone(),
            values,
            index: self.index.clone(),
        })
    }

    /// Keep only rows whose position has `keep[i] == true`, consuming `self`.
    ///
    /// Positions beyond `keep.len()` are dropped.
    pub fn retain_mask(mut self, keep: &[bool]) -> Self {
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(false));
        self.index.retain_mask(keep);
        self
    }

    /// Convert a single-column dataset into a [`Column`]; other widths are returned unchanged.
    pub fn into_column(self) -> Result<Column, Self> {
        if self.schema.fields.len() != 1 {
            return Err(self);
        }
        let Self {
            mut schema,
            rows,
            index,
        } = self;
        let field = schema.fields.remove(0);
        let values = rows
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect();
        Ok(Column {
            field,
            values,
            index,
        })
    }
}

/// A single named, labeled sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name and type.
    pub field: Field,
    /// Values, one per row.
    pub values: Vec<Value>,
    /// Row labels; always the same length as `values`.
    pub index: RowIndex,
}

impl Column {
    /// Create a column with a positional index and a type inferred from its values.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let data_type = DataType::infer(&values);
        let index = RowIndex::positional(values.len());
        Self {
            field: Field::new(name, data_type),
            values,
            index,
        }
    }

    /// Create a column with explicit labels and a type inferred from its values.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not have one label per value.
    pub fn with_index(name: impl Into<String>, values: Vec<Value>, index: RowIndex) -> Self {
        assert!(
            index.len() == values.len(),
            "index length {} does not match value count {}",
            index.len(),
            values.len()
        );
        let data_type = DataType::infer(&values);
        Self {
            field: Field::new(name, data_type),
            values,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// View this column as a one-field table.
    pub fn into_dataset(self) -> DataSet {
        let rows = self.values.into_iter().map(|v| vec![v]).collect();
        DataSet {
            schema: Schema::new(vec![self.field]),
            rows,
            index: self.index,
        }
    }
}

/// The value flowing through a pipeline: a table or a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Zero or more named columns.
    Table(DataSet),
    /// Exactly one named column.
    Column(Column),
}

impl Frame {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Table(ds) => ds.row_count(),
            Self::Column(col) => col.len(),
        }
    }

    pub fn column_count(&self) -> usize {
        match self {
            Self::Table(ds) => ds.column_count(),
            Self::Column(_) => 1,
        }
    }

    /// Data column names in order.
    pub fn column_names(&self) -> Vec<String> {
        match self {
            Self::Table(ds) => ds.schema.names(),
            Self::Column(col) => vec![col.field.name.clone()],
        }
    }

    pub fn index(&self) -> &RowIndex {
        match self {
            Self::Table(ds) => &ds.index,
            Self::Column(col) => &col.index,
        }
    }

    /// `"table"` or `"column"`, for diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Column(_) => "column",
        }
    }

    /// View the frame as a table (a column becomes a one-field table).
    pub fn into_dataset(self) -> DataSet {
        match self {
            Self::Table(ds) => ds,
            Self::Column(col) => col.into_dataset(),
        }
    }

    /// Apply a table operation while keeping the frame's shape.
    ///
    /// A column frame is widened to a one-field table for `f`, and narrowed back to a column if
    /// the result still has exactly one field.
    pub fn map_table<E, F>(self, f: F) -> Result<Self, E>
    where
        F: FnOnce(DataSet) -> Result<DataSet, E>,
    {
        match self {
            Self::Table(ds) => f(ds).map(Self::Table),
            Self::Column(col) => {
                let out = f(col.into_dataset())?;
                Ok(match out.into_column() {
                    Ok(col) => Self::Column(col),
                    Err(ds) => Self::Table(ds),
                })
            }
        }
    }
}

impl From<DataSet> for Frame {
    fn from(ds: DataSet) -> Self {
        Self::Table(ds)
    }
}

impl From<Column> for Frame {
    fn from(col: Column) -> Self {
        Self::Column(col)
    }
}

/// Which columns an instruction refers to.
///
/// A single label selects a [`Column`]; a list (even of one label) selects a table with the
/// listed columns in the listed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    /// One label.
    Single(String),
    /// A list of labels.
    Many(Vec<String>),
}

impl ColumnSpec {
    /// Labels in listed order.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Self::Single(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(name: &str) -> Self {
        Self::Single(name.to_owned())
    }
}

impl From<Vec<&str>> for ColumnSpec {
    fn from(names: Vec<&str>) -> Self {
        Self::Many(names.into_iter().map(str::to_owned).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, DataSet, DataType, Field, Frame, Schema, Value};

    fn sample() -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("x", DataType::Int64),
                Field::new("y", DataType::Utf8),
            ]),
            vec![
                vec![Value::Int64(1), Value::Utf8("a".to_string())],
                vec![Value::Int64(2), Value::Utf8("b".to_string())],
            ],
        )
    }

    #[test]
    fn new_dataset_gets_positional_index() {
        let ds = sample();
        assert!(ds.index.is_positional());
        assert_eq!(ds.index.labels, vec![vec![Value::Int64(0)], vec![Value::Int64(1)]]);
    }

    #[test]
    fn retain_mask_keeps_surviving_labels() {
        let out = sample().retain_mask(&[false, true]);
        assert_eq!(out.row_count(), 1);
        assert_eq!(out.rows[0][0], Value::Int64(2));
        assert_eq!(out.index.labels, vec![vec![Value::Int64(1)]]);
    }

    #[test]
    fn column_round_trips_through_dataset() {
        let col = sample().column("y").unwrap();
        assert_eq!(col.field, Field::new("y", DataType::Utf8));
        let back = col.clone().into_dataset().into_column().unwrap();
        assert_eq!(back, col);
    }

    #[test]
    fn map_table_keeps_column_shape() {
        let frame = Frame::Column(Column::new("n", vec![Value::Int64(1), Value::Int64(2)]));
        let out = frame
            .map_table(|ds| Ok::<_, ()>(ds.retain_mask(&[false, true])))
            .unwrap();
        match out {
            Frame::Column(col) => {
                assert_eq!(col.values, vec![Value::Int64(2)]);
                assert_eq!(col.index.labels, vec![vec![Value::Int64(1)]]);
            }
            Frame::Table(_) => panic!("expected column shape"),
        }
    }

    #[test]
    fn compare_mixes_ints_and_floats() {
        assert!(Value::Int64(2).loose_eq(&Value::Float64(2.0)));
        assert_ne!(Value::Int64(2).key(), Value::Float64(2.0).key());
        assert!(!Value::Null.loose_eq(&Value::Null));
        assert_eq!(Value::Null.key(), Value::Null.key());
        assert_eq!(Value::Utf8("a".into()).compare(&Value::Int64(1)), None);
    }

    #[test]
    fn json_objects_become_structs() {
        let v = Value::from_json(&serde_json::json!({"a": 1, "b": "x"}));
        assert_eq!(
            v,
            Value::Struct(vec![
                ("a".to_string(), Value::Int64(1)),
                ("b".to_string(), Value::Utf8("x".to_string())),
            ])
        );
        assert_eq!(v.to_string(), r#"{"a":1,"b":"x"}"#);
    }

    #[test]
    fn infer_skips_nulls() {
        assert_eq!(
            DataType::infer(&[Value::Null, Value::Bool(true)]),
            DataType::Bool
        );
        assert_eq!(DataType::infer(&[Value::Null]), DataType::Utf8);
    }
}
