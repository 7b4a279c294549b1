//! Dataset persistence.
//!
//! Only delimited text is written. [`ExportFormat::from_path`] is checked before any file is
//! created, so an unsupported target never leaves a partial file behind.

pub mod csv;

use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

pub use csv::{CsvWriteOptions, write_csv_to_path, write_csv_to_writer};

/// Output formats supported by `save`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
}

impl ExportFormat {
    /// Infer the format from the file extension (case-insensitive).
    ///
    /// Fails with [`PipelineError::UnsupportedFormat`] for anything but `.csv`.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            _ => Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
