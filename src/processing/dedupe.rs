//! Duplicate row removal.

use std::collections::HashSet;

use crate::error::PipelineResult;
use crate::types::{ColumnSpec, Frame, Value, ValueKey};

use super::select::positions_of;

/// Remove rows whose values at the key columns duplicate an earlier row's.
///
/// The first occurrence of each key is kept and surviving rows keep their relative order and
/// labels. Keys compare type-strictly (see [`Value::key`]); nulls are equal to each other.
pub fn drop_duplicates(frame: Frame, spec: &ColumnSpec) -> PipelineResult<Frame> {
    frame.map_table(|ds| {
        let positions = positions_of(&ds.schema, &spec.labels())?;

        let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(ds.row_count());
        let keep: Vec<bool> = ds
            .rows
            .iter()
            .map(|row| {
                let key = positions
                    .iter()
                    .map(|&i| row.get(i).map(Value::key).unwrap_or(ValueKey::Null))
                    .collect();
                seen.insert(key)
            })
            .collect();

        Ok(ds.retain_mask(&keep))
    })
}

#[cfg(test)]
mod tests {
    use super::drop_duplicates;
    use crate::types::{ColumnSpec, DataSet, DataType, Field, Frame, Schema, Value};

    fn kv(rows: &[(i64, &str)]) -> Frame {
        Frame::Table(DataSet::new(
            Schema::new(vec![
                Field::new("k", DataType::Int64),
                Field::new("v", DataType::Utf8),
            ]),
            rows.iter()
                .map(|(k, v)| vec![Value::Int64(*k), Value::Utf8((*v).to_string())])
                .collect(),
        ))
    }

    #[test]
    fn keeps_first_occurrence() {
        let out = drop_duplicates(kv(&[(1, "a"), (1, "b"), (2, "c")]), &ColumnSpec::from(vec!["k"]))
            .unwrap()
            .into_dataset();
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Int64(1), Value::Utf8("a".to_string())],
                vec![Value::Int64(2), Value::Utf8("c".to_string())],
            ]
        );
        assert_eq!(out.index.labels, vec![vec![Value::Int64(0)], vec![Value::Int64(2)]]);
    }

    #[test]
    fn multi_column_keys() {
        let out = drop_duplicates(
            kv(&[(1, "a"), (1, "b"), (1, "a")]),
            &ColumnSpec::from(vec!["k", "v"]),
        )
        .unwrap();
        assert_eq!(out.row_count(), 2);
    }

    #[test]
    fn survivors_keep_relative_order() {
        let out = drop_duplicates(
            kv(&[(3, "a"), (1, "b"), (3, "c"), (2, "d"), (1, "e")]),
            &ColumnSpec::from("k"),
        )
        .unwrap()
        .into_dataset();
        let keys: Vec<&Value> = out.rows.iter().map(|r| &r[0]).collect();
        assert_eq!(keys, vec![&Value::Int64(3), &Value::Int64(1), &Value::Int64(2)]);
    }
}
