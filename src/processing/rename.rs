//! Column renaming.

use crate::error::{PipelineError, PipelineResult};
use crate::types::Frame;

/// Rename exactly one column from `old` to `new`.
///
/// Fails with [`PipelineError::MissingColumn`] if `old` is absent, and with
/// [`PipelineError::ColumnConflict`] if `new` names a different existing column. Renaming a
/// column to its own name is a no-op.
pub fn rename(frame: Frame, old: &str, new: &str) -> PipelineResult<Frame> {
    frame.map_table(|mut ds| {
        let idx = ds
            .schema
            .index_of(old)
            .ok_or_else(|| PipelineError::missing_column(old, ds.schema.names()))?;
        if old == new {
            return Ok(ds);
        }
        if ds.schema.index_of(new).is_some() {
            return Err(PipelineError::ColumnConflict {
                from: old.to_owned(),
                to: new.to_owned(),
            });
        }
        ds.schema.fields[idx].name = new.to_owned();
        Ok(ds)
    })
}
