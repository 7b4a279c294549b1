//! Declarative pipeline execution.
//!
//! A pipeline config is a JSON array of instructions, each an object with a string `action`
//! plus action-specific fields:
//!
//! | action | fields |
//! |---|---|
//! | `select_columns` (`filter_columns`) | `columns` |
//! | `rename_column` | `old`, `new` |
//! | `remove_columns` | `columns` |
//! | `drop_duplicates` | `columns` |
//! | `set_index` | `columns` |
//! | `transform` (`transform_column`) | `columns`, `script`, `result`, `args`?, `kwargs`? |
//! | `filter_rows` | `condition` (expression string or `{columns, script, args?, kwargs?}`) |
//! | `save` | `fname`, `args`?, `kwargs`? |
//! | `log` | `message`? |
//!
//! Wherever `columns` is accepted, `column` may be used instead.
//!
//! [`Pipeline`] runs a [`PipelineConfig`] strictly in order, threading the [`crate::types::Frame`]
//! from one step to the next. [`validate_config`] is an independent pre-pass that checks every
//! action against an [`ActionWhitelist`] without running anything.

mod actions;
pub mod condition;
pub mod dispatch;
pub mod executor;
pub mod instruction;
pub mod observer;
pub mod validate;

pub use condition::Condition;
pub use dispatch::{Action, StepContext, apply_instruction};
pub use executor::{ConfigSource, Pipeline, PipelineOptions, RunReport, apply_pipeline};
pub use instruction::{Instruction, PipelineConfig};
pub use observer::{
    CompositeObserver, FileObserver, FrameStats, PipelineEvent, PipelineObserver,
    StdErrPipelineObserver, render_instruction,
};
pub use validate::{ActionWhitelist, validate_config};
