//! Row filtering for [`crate::types::Frame`].

use crate::error::{PipelineError, PipelineResult};
use crate::types::Frame;

/// Keep the rows of `frame` whose position has `mask[i] == true`.
///
/// The frame keeps its shape, and surviving rows keep their order and labels. Fails with
/// [`PipelineError::Alignment`] if `mask` does not have one entry per row.
pub fn filter_mask(frame: Frame, mask: &[bool]) -> PipelineResult<Frame> {
    if mask.len() != frame.row_count() {
        return Err(PipelineError::Alignment {
            message: format!(
                "mask has {} entries but the dataset has {} rows",
                mask.len(),
                frame.row_count()
            ),
        });
    }
    frame.map_table(|ds| Ok(ds.retain_mask(mask)))
}

#[cfg(test)]
mod tests {
    use super::filter_mask;
    use crate::error::PipelineError;
    use crate::types::{Column, DataSet, DataType, Field, Frame, Schema, Value};

    fn sample_dataset() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("active", DataType::Bool),
            Field::new("name", DataType::Utf8),
        ]);

        let rows = vec![
            vec![Value::Int64(1), Value::Bool(true), Value::Utf8("a".to_string())],
            vec![Value::Int64(2), Value::Bool(false), Value::Utf8("b".to_string())],
            vec![Value::Int64(3), Value::Bool(true), Value::Utf8("c".to_string())],
        ];

        DataSet::new(schema, rows)
    }

    #[test]
    fn filter_mask_can_return_empty_dataset() {
        let ds = sample_dataset();
        let out = filter_mask(Frame::Table(ds.clone()), &[false, false, false])
            .unwrap()
            .into_dataset();
        assert_eq!(out.schema, ds.schema);
        assert!(out.rows.is_empty());
        assert!(out.index.is_empty());
    }

    #[test]
    fn filter_mask_keeps_order_and_labels() {
        let out = filter_mask(Frame::Table(sample_dataset()), &[false, true, true])
            .unwrap()
            .into_dataset();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.rows[0][0], Value::Int64(2));
        assert_eq!(out.index.labels, vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]);
    }

    #[test]
    fn filter_mask_on_column_keeps_shape() {
        let col = Column::new("n", vec![Value::Int64(1), Value::Int64(6)]);
        let out = filter_mask(Frame::Column(col), &[false, true]).unwrap();
        assert!(matches!(out, Frame::Column(ref c) if c.values == vec![Value::Int64(6)]));
    }

    #[test]
    fn filter_mask_length_mismatch_is_rejected() {
        let err = filter_mask(Frame::Table(sample_dataset()), &[true]).unwrap_err();
        assert!(matches!(err, PipelineError::Alignment { .. }));
    }
}
