//! In-memory dataset operations.
//!
//! The processing layer implements the table operations that pipeline actions are built from.
//! Every operation except [`select()`] consumes its input [`crate::types::Frame`] and returns a
//! newly produced one, so no step can observe a previous step's data.
//!
//! Currently implemented:
//!
//! - [`select()`] / [`remove()`]: column subsetting (a single label yields a column, a list a
//!   table)
//! - [`rename()`]: single label rename, never overwriting another column
//! - [`drop_duplicates()`]: keep-first de-duplication by key columns
//! - [`set_index()`]: promotion of columns into row labels
//! - [`combine()`]: label-aligned horizontal join, later columns winning
//! - [`filter_mask()`]: row filtering by boolean mask
//!
//! ## Example: select → rename → dedupe
//!
//! ```rust
//! use tabular_pipeline::processing::{drop_duplicates, rename, select};
//! use tabular_pipeline::types::{ColumnSpec, DataSet, DataType, Field, Frame, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("k", DataType::Int64),
//!         Field::new("v", DataType::Utf8),
//!     ]),
//!     vec![
//!         vec![Value::Int64(1), Value::Utf8("a".to_string())],
//!         vec![Value::Int64(1), Value::Utf8("b".to_string())],
//!         vec![Value::Int64(2), Value::Utf8("c".to_string())],
//!     ],
//! );
//!
//! let frame = rename(Frame::Table(ds), "k", "key").unwrap();
//! let frame = drop_duplicates(frame, &ColumnSpec::from("key")).unwrap();
//! assert_eq!(frame.row_count(), 2);
//!
//! let v = select(&frame, &ColumnSpec::from("v")).unwrap();
//! assert!(matches!(v, Frame::Column(_)));
//! ```

pub mod combine;
pub mod dedupe;
pub mod filter;
pub mod index;
pub mod rename;
pub mod select;

pub use combine::{align, combine};
pub use dedupe::drop_duplicates;
pub use filter::filter_mask;
pub use index::set_index;
pub use rename::rename;
pub use select::{remove, select};
