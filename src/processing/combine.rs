//! Horizontal combination of two frames aligned by row label.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, Frame, RowIndex, Value, ValueKey};

/// For each row of `target`, the position of the row in `source` carrying the same label.
///
/// Identical indexes align positionally. Otherwise labels are matched by key; a label missing
/// from `source` yields `None`, and duplicate labels in `source` are an error since they make
/// the match ambiguous.
pub fn align(target: &RowIndex, source: &RowIndex) -> PipelineResult<Vec<Option<usize>>> {
    if target.labels == source.labels {
        return Ok((0..target.len()).map(Some).collect());
    }

    let mut positions: HashMap<Vec<ValueKey>, usize> = HashMap::with_capacity(source.len());
    for row in 0..source.len() {
        match positions.entry(source.key(row)) {
            Entry::Vacant(slot) => {
                slot.insert(row);
            }
            Entry::Occupied(_) => {
                return Err(PipelineError::Alignment {
                    message: format!("duplicate row label {:?}", source.labels[row]),
                });
            }
        }
    }

    Ok((0..target.len())
        .map(|row| positions.get(&target.key(row)).copied())
        .collect())
}

/// Join the columns of `right` onto `left`.
///
/// The result keeps `left`'s rows and labels. A column of `right` whose name already exists in
/// `left` replaces it in place; other columns are appended in `right`'s order. Rows of `left`
/// whose label does not occur in `right` receive [`Value::Null`] in the joined columns.
pub fn combine(left: Frame, right: Frame) -> PipelineResult<Frame> {
    let right = right.into_dataset();
    let DataSet {
        mut schema,
        mut rows,
        index,
    } = left.into_dataset();

    let sources = align(&index, &right.index)?;

    let targets: Vec<usize> = right
        .schema
        .fields
        .iter()
        .map(|field| match schema.index_of(&field.name) {
            Some(i) => {
                schema.fields[i] = field.clone();
                i
            }
            None => {
                schema.fields.push(field.clone());
                schema.fields.len() - 1
            }
        })
        .collect();

    let width = schema.fields.len();
    for (row, &source) in rows.iter_mut().zip(&sources) {
        row.resize(width, Value::Null);
        for (j, &target) in targets.iter().enumerate() {
            row[target] = source
                .and_then(|r| right.rows.get(r))
                .and_then(|src| src.get(j))
                .cloned()
                .unwrap_or_default();
        }
    }

    Ok(Frame::Table(DataSet::with_index(schema, rows, index)))
}
