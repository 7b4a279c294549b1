//! Ingestion entrypoints and implementations.
//!
//! [`ingest_from_path`] auto-detects the format by file extension (or takes it from
//! [`IngestionOptions`]) and loads the file into an in-memory [`crate::types::DataSet`].
//!
//! Format-specific functions are also available under [`csv`] and [`json`].

pub mod csv;
pub mod json;
pub mod unified;

pub use unified::{IngestionFormat, IngestionOptions, ingest_from_path};
