//! `tabular-pipeline` runs declarative, config-driven transformation pipelines over an in-memory
//! tabular [`types::DataSet`].
//!
//! A pipeline config is a JSON array of instructions. Each instruction names an `action`
//! (`select_columns`, `rename_column`, `remove_columns`, `drop_duplicates`, `set_index`,
//! `transform`, `filter_rows`, `save`, `log`) plus the fields that action needs. The executor
//! applies the instructions strictly in order, threading a [`types::Frame`] (a table or a single
//! column) from one step to the next, and stops at the first error.
//!
//! `transform` and `filter_rows` call pluggable functions: a fixed table of [`functions::builtins`]
//! addressed by bare name, or functions registered at runtime on a
//! [`functions::FunctionRegistry`] and addressed by `(locator, symbol)`.
//!
//! ## Quick example
//!
//! ```rust
//! use tabular_pipeline::pipeline::{Pipeline, PipelineConfig};
//! use tabular_pipeline::types::{DataSet, DataType, Field, Frame, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("id", DataType::Int64),
//!         Field::new("name", DataType::Utf8),
//!         Field::new("score", DataType::Float64),
//!     ]),
//!     vec![
//!         vec![Value::Int64(1), Value::Utf8("Ada".into()), Value::Float64(98.5)],
//!         vec![Value::Int64(2), Value::Utf8("Grace".into()), Value::Float64(42.0)],
//!         vec![Value::Int64(2), Value::Utf8("Grace".into()), Value::Float64(42.0)],
//!     ],
//! );
//!
//! let config = PipelineConfig::from_json_str(
//!     r#"[
//!         {"action": "drop_duplicates", "columns": ["id"]},
//!         {"action": "filter_rows", "condition": "score > 50"},
//!         {"action": "select_columns", "columns": "name"}
//!     ]"#,
//! )?;
//!
//! let out = Pipeline::new(config).run(Frame::Table(ds))?;
//! assert_eq!(out.row_count(), 1);
//! assert_eq!(out.column_names(), vec!["name".to_string()]);
//! # Ok::<(), tabular_pipeline::PipelineError>(())
//! ```
//!
//! ## Modules
//!
//! - [`types`]: schema, values, row labels, and the [`types::Frame`] passed between steps
//! - [`processing`]: the table operations actions are built from
//! - [`functions`]: built-in functions and the runtime function registry
//! - [`pipeline`]: instructions, dispatch, execution, validation and observers
//! - [`export`]: CSV writing used by `save`
//! - [`ingestion`]: loading CSV/JSON files into a [`types::DataSet`]
//! - [`error`]: error types

pub mod error;
pub mod export;
pub mod functions;
pub mod ingestion;
pub mod pipeline;
pub mod processing;
pub mod types;

pub use error::{IngestionError, IngestionResult, PipelineError, PipelineResult};
pub use functions::{CallArgs, CallableRef, FunctionError, FunctionRegistry};
pub use pipeline::{
    ActionWhitelist, Pipeline, PipelineConfig, PipelineOptions, apply_pipeline, validate_config,
};
