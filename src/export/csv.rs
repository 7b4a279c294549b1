//! CSV export implementation.

use std::io::Write;
use std::path::Path;

use crate::error::PipelineResult;
use crate::types::{Frame, Value};

use super::ExportFormat;

/// Options for [`write_csv_to_path`] / [`write_csv_to_writer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvWriteOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Write a header row of column names.
    pub has_header: bool,
    /// Write the row labels as leading columns.
    pub include_index: bool,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            include_index: false,
        }
    }
}

impl CsvWriteOptions {
    /// Defaults for `frame`: row labels are written only when they come from promoted columns.
    pub fn for_frame(frame: &Frame) -> Self {
        Self {
            include_index: !frame.index().is_positional(),
            ..Self::default()
        }
    }
}

/// Write `frame` to a CSV file.
///
/// Fails with [`crate::error::PipelineError::UnsupportedFormat`] before touching the
/// filesystem unless `path` has a `.csv` extension.
pub fn write_csv_to_path(
    frame: &Frame,
    path: impl AsRef<Path>,
    options: &CsvWriteOptions,
) -> PipelineResult<()> {
    let path = path.as_ref();
    ExportFormat::from_path(path)?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_path(path)?;
    write_csv_to_writer(frame, &mut wtr, options)
}

/// Write `frame` through an existing CSV writer.
///
/// Values render the way [`Value`]'s `Display` does: null is an empty field, structs are
/// compact JSON. Quoting is left to the writer.
pub fn write_csv_to_writer<W: Write>(
    frame: &Frame,
    wtr: &mut csv::Writer<W>,
    options: &CsvWriteOptions,
) -> PipelineResult<()> {
    let index = frame.index();

    if options.has_header {
        let mut header: Vec<String> = Vec::new();
        if options.include_index {
            if index.is_positional() {
                header.push(String::new());
            } else {
                header.extend(index.fields.iter().map(|f| f.name.clone()));
            }
        }
        header.extend(frame.column_names());
        wtr.write_record(&header)?;
    }

    let mut record: Vec<String> = Vec::new();
    for row in 0..frame.row_count() {
        record.clear();
        if options.include_index {
            if let Some(label) = index.labels.get(row) {
                record.extend(label.iter().map(Value::to_string));
            }
        }
        match frame {
            Frame::Table(ds) => record.extend(ds.rows[row].iter().map(Value::to_string)),
            Frame::Column(col) => record.extend(col.values.get(row).map(Value::to_string)),
        }
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CsvWriteOptions, write_csv_to_writer};
    use crate::processing::set_index;
    use crate::types::{Column, ColumnSpec, DataSet, DataType, Field, Frame, Schema, Value};

    fn sample() -> Frame {
        Frame::Table(DataSet::new(
            Schema::new(vec![
                Field::new("id", DataType::Int64),
                Field::new("name", DataType::Utf8),
                Field::new("score", DataType::Float64),
            ]),
            vec![
                vec![Value::Int64(1), Value::Utf8("a, b".to_string()), Value::Float64(1.5)],
                vec![Value::Int64(2), Value::Null, Value::Float64(2.0)],
            ],
        ))
    }

    fn render(frame: &Frame, options: &CsvWriteOptions) -> String {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(options.delimiter)
            .from_writer(Vec::new());
        write_csv_to_writer(frame, &mut wtr, options).unwrap();
        match wtr.into_inner() {
            Ok(bytes) => String::from_utf8(bytes).unwrap(),
            Err(_) => panic!("csv writer was not flushed"),
        }
    }

    #[test]
    fn writes_header_and_rows_with_quoting() {
        let out = render(&sample(), &CsvWriteOptions::default());
        assert_eq!(out, "id,name,score\n1,\"a, b\",1.5\n2,,2\n");
    }

    #[test]
    fn custom_delimiter_and_no_header() {
        let options = CsvWriteOptions {
            delimiter: b';',
            has_header: false,
            include_index: false,
        };
        assert_eq!(render(&sample(), &options), "1;a, b;1.5\n2;;2\n");
    }

    #[test]
    fn promoted_index_is_written_by_default() {
        let frame = set_index(sample(), &ColumnSpec::from("id")).unwrap();
        let out = render(&frame, &CsvWriteOptions::for_frame(&frame));
        assert_eq!(out, "id,name,score\n1,\"a, b\",1.5\n2,,2\n");
    }

    #[test]
    fn positional_index_gets_blank_header() {
        let col = Frame::Column(Column::new("v", vec![Value::Bool(true), Value::Bool(false)]));
        let options = CsvWriteOptions {
            include_index: true,
            ..CsvWriteOptions::default()
        };
        assert_eq!(render(&col, &options), ",v\n0,true\n1,false\n");
    }
}
