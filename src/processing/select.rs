//! Column selection and removal.

use crate::error::{PipelineError, PipelineResult};
use crate::types::{ColumnSpec, DataSet, Frame, Schema};

/// Select columns from `frame`.
///
/// - A [`ColumnSpec::Single`] label yields a [`Frame::Column`].
/// - A [`ColumnSpec::Many`] list yields a [`Frame::Table`] with columns in the listed order,
///   even for a one-element list.
///
/// Rows, row order and row labels are unchanged. Fails with
/// [`PipelineError::MissingColumn`] if any label is absent.
pub fn select(frame: &Frame, spec: &ColumnSpec) -> PipelineResult<Frame> {
    match (frame, spec) {
        (Frame::Column(col), ColumnSpec::Single(name)) => {
            if col.name() == name {
                Ok(Frame::Column(col.clone()))
            } else {
                Err(PipelineError::missing_column(name, vec![col.name().to_owned()]))
            }
        }
        (Frame::Table(ds), ColumnSpec::Single(name)) => ds
            .column(name)
            .map(Frame::Column)
            .ok_or_else(|| PipelineError::missing_column(name, ds.schema.names())),
        (Frame::Column(col), ColumnSpec::Many(names)) => {
            select_many(&col.clone().into_dataset(), names).map(Frame::Table)
        }
        (Frame::Table(ds), ColumnSpec::Many(names)) => select_many(ds, names).map(Frame::Table),
    }
}

/// Drop the columns named by `spec`, consuming `frame`.
///
/// Dropping the only column of a [`Frame::Column`] leaves an empty table that keeps the row
/// labels.
pub fn remove(frame: Frame, spec: &ColumnSpec) -> PipelineResult<Frame> {
    let ds = frame.into_dataset();
    let positions = positions_of(&ds.schema, &spec.labels())?;

    let keep: Vec<bool> = (0..ds.schema.fields.len())
        .map(|i| !positions.contains(&i))
        .collect();
    let DataSet {
        schema,
        rows,
        index,
    } = ds;

    let fields = schema
        .fields
        .into_iter()
        .zip(&keep)
        .filter_map(|(f, &k)| k.then_some(f))
        .collect();
    let rows = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(v, &k)| k.then_some(v))
                .collect()
        })
        .collect();

    Ok(Frame::Table(DataSet::with_index(
        Schema::new(fields),
        rows,
        index,
    )))
}

/// Resolve labels to schema positions, failing on the first absent label.
pub(crate) fn positions_of(schema: &Schema, labels: &[&str]) -> PipelineResult<Vec<usize>> {
    labels
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .ok_or_else(|| PipelineError::missing_column(name, schema.names()))
        })
        .collect()
}

fn select_many(ds: &DataSet, names: &[String]) -> PipelineResult<DataSet> {
    let labels: Vec<&str> = names.iter().map(String::as_str).collect();
    let positions = positions_of(&ds.schema, &labels)?;

    let fields = positions
        .iter()
        .map(|&i| ds.schema.fields[i].clone())
        .collect();
    let rows = ds
        .rows
        .iter()
        // Short rows read as null.
        .map(|row| {
            positions
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(DataSet::with_index(
        Schema::new(fields),
        rows,
        ds.index.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{remove, select};
    use crate::error::PipelineError;
    use crate::types::{ColumnSpec, DataSet, DataType, Field, Frame, Schema, Value};

    fn xy() -> Frame {
        Frame::Table(DataSet::new(
            Schema::new(vec![
                Field::new("x", DataType::Int64),
                Field::new("y", DataType::Utf8),
            ]),
            vec![
                vec![Value::Int64(1), Value::Utf8("a".to_string())],
                vec![Value::Int64(2), Value::Utf8("b".to_string())],
            ],
        ))
    }

    #[test]
    fn single_label_yields_column() {
        let out = select(&xy(), &ColumnSpec::from("x")).unwrap();
        match out {
            Frame::Column(col) => {
                assert_eq!(col.name(), "x");
                assert_eq!(col.values, vec![Value::Int64(1), Value::Int64(2)]);
            }
            Frame::Table(_) => panic!("expected a column"),
        }
    }

    #[test]
    fn one_element_list_yields_table() {
        let out = select(&xy(), &ColumnSpec::from(vec!["x"])).unwrap();
        assert!(matches!(out, Frame::Table(ref ds) if ds.schema.names() == vec!["x"]));
    }

    #[test]
    fn list_reorders_columns() {
        let out = select(&xy(), &ColumnSpec::from(vec!["y", "x"])).unwrap();
        let ds = out.into_dataset();
        assert_eq!(ds.schema.names(), vec!["y", "x"]);
        assert_eq!(
            ds.rows[0],
            vec![Value::Utf8("a".to_string()), Value::Int64(1)]
        );
    }

    #[test]
    fn missing_label_is_an_error() {
        let err = select(&xy(), &ColumnSpec::from(vec!["x", "nope"])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { ref column, .. } if column == "nope"));
    }

    #[test]
    fn short_rows_select_as_null() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("x", DataType::Int64),
                Field::new("y", DataType::Utf8),
            ]),
            vec![vec![Value::Int64(1), Value::Utf8("a".to_string())], vec![Value::Int64(2)]],
        );
        let out = select(&Frame::Table(ds), &ColumnSpec::from(vec!["y", "x"]))
            .unwrap()
            .into_dataset();
        assert_eq!(out.rows[1], vec![Value::Null, Value::Int64(2)]);
    }

    #[test]
    fn remove_drops_named_columns() {
        let out = remove(xy(), &ColumnSpec::from("x")).unwrap().into_dataset();
        assert_eq!(out.schema.names(), vec!["y"]);
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows[1], vec![Value::Utf8("b".to_string())]);
    }

    #[test]
    fn remove_missing_column_fails() {
        let err = remove(xy(), &ColumnSpec::from(vec!["z"])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }
}
