//! Promotion of data columns into the row index.

use crate::error::PipelineResult;
use crate::types::{ColumnSpec, DataSet, Frame, RowIndex, Schema, Value};

use super::select::positions_of;

/// Move the columns named by `spec` out of the data area and into the row index.
///
/// The new index levels appear in the listed order and replace any previous index. The row count is
/// unchanged, and the promoted columns can no longer be selected as data columns.
pub fn set_index(frame: Frame, spec: &ColumnSpec) -> PipelineResult<Frame> {
    let ds = frame.into_dataset();
    let positions = positions_of(&ds.schema, &spec.labels())?;

    let DataSet { schema, rows, .. } = ds;
    let index_fields = positions
        .iter()
        .map(|&i| schema.fields[i].clone())
        .collect();

    let mut labels = Vec::with_capacity(rows.len());
    let mut data_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells: Vec<Option<Value>> = row.into_iter().map(Some).collect();
        let label = positions
            .iter()
            .map(|&i| cells.get_mut(i).and_then(Option::take).unwrap_or_default())
            .collect();
        labels.push(label);
        data_rows.push(cells.into_iter().flatten().collect());
    }

    let data_fields = schema
        .fields
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !positions.contains(i))
        .map(|(_, f)| f)
        .collect();

    Ok(Frame::Table(DataSet::with_index(
        Schema::new(data_fields),
        data_rows,
        RowIndex {
            fields: index_fields,
            labels,
        },
    )))
}
