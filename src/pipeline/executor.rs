//! Sequential execution of a pipeline config.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::PipelineResult;
use crate::functions::FunctionRegistry;
use crate::types::Frame;

use super::dispatch::{StepContext, apply_instruction};
use super::instruction::PipelineConfig;
use super::observer::{FrameStats, PipelineEvent, PipelineObserver, render_instruction};
use super::validate::{ActionWhitelist, validate_config};

/// Options that control a pipeline run without changing its result.
#[derive(Clone, Default)]
pub struct PipelineOptions {
    /// Print each instruction (pretty JSON) to stderr right before it runs.
    pub verbose: bool,
    /// Receives run, step and `log` events.
    pub observer: Option<Arc<dyn PipelineObserver>>,
    /// When set, the whole config is checked against this whitelist before any step runs.
    pub whitelist: Option<ActionWhitelist>,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("verbose", &self.verbose)
            .field("observer_set", &self.observer.is_some())
            .field("whitelist", &self.whitelist)
            .finish()
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub rows_before: usize,
    pub columns_before: usize,
    pub rows_after: usize,
    pub columns_after: usize,
    /// Number of instructions applied.
    pub steps_applied: usize,
    pub duration: Duration,
}

impl RunReport {
    /// One-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "pipeline completed: rows {} -> {}, columns {} -> {}, {} steps, {:.3}s",
            self.rows_before,
            self.rows_after,
            self.columns_before,
            self.columns_after,
            self.steps_applied,
            self.duration.as_secs_f64()
        )
    }
}

/// A config bound to a function registry and run options.
///
/// ```rust
/// use tabular_pipeline::pipeline::{Pipeline, PipelineConfig};
/// use tabular_pipeline::types::{Column, Frame, Value};
///
/// let config = PipelineConfig::from_json_str(
///     r#"[{"action": "filter_rows", "condition": {"columns": "n", "script": "greater_than", "args": 5}}]"#,
/// )
/// .unwrap();
/// let frame = Frame::Column(Column::new("n", vec![Value::Int64(1), Value::Int64(6), Value::Int64(10)]));
///
/// let out = Pipeline::new(config).run(frame).unwrap();
/// assert_eq!(out.row_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: FunctionRegistry,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            registry: FunctionRegistry::new(),
            options: PipelineOptions::default(),
        }
    }

    /// Load the config from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        PipelineConfig::from_path(path).map(Self::new)
    }

    /// Resolve `(locator, symbol)` callables against `registry`.
    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every instruction in order and return the final frame.
    ///
    /// Stops at the first failing instruction and returns its error unchanged.
    pub fn run(&self, frame: Frame) -> PipelineResult<Frame> {
        self.run_with_report(frame).map(|(frame, _)| frame)
    }

    /// Like [`Pipeline::run`], also returning a [`RunReport`].
    pub fn run_with_report(&self, frame: Frame) -> PipelineResult<(Frame, RunReport)> {
        if let Some(whitelist) = &self.options.whitelist {
            validate_config(&self.config, whitelist)?;
        }

        let started = Instant::now();
        let observer = self.options.observer.as_deref();
        let before = FrameStats::of(&frame);
        emit(
            observer,
            PipelineEvent::RunStarted {
                steps: self.config.len(),
                input: before,
            },
        );

        let mut frame = frame;
        for (step, instruction) in self.config.iter().enumerate() {
            if self.options.verbose {
                eprintln!("{}", render_instruction(step, instruction.as_json()));
            }
            let action = instruction.action_name().unwrap_or("<missing>").to_owned();
            emit(
                observer,
                PipelineEvent::StepStarted {
                    step,
                    action: action.clone(),
                },
            );

            let ctx = StepContext {
                step,
                registry: &self.registry,
                observer,
                verbose: self.options.verbose,
            };
            let step_started = Instant::now();
            frame = match apply_instruction(frame, instruction, &ctx) {
                Ok(next) => next,
                Err(err) => {
                    emit(
                        observer,
                        PipelineEvent::StepFailed {
                            step,
                            action,
                            error: err.to_string(),
                        },
                    );
                    return Err(err);
                }
            };

            emit(
                observer,
                PipelineEvent::StepFinished {
                    step,
                    action,
                    output: FrameStats::of(&frame),
                    elapsed: step_started.elapsed(),
                },
            );
        }

        let after = FrameStats::of(&frame);
        let report = RunReport {
            rows_before: before.rows,
            columns_before: before.columns,
            rows_after: after.rows,
            columns_after: after.columns,
            steps_applied: self.config.len(),
            duration: started.elapsed(),
        };
        emit(
            observer,
            PipelineEvent::RunFinished {
                steps: report.steps_applied,
                output: after,
                elapsed: report.duration,
            },
        );
        Ok((frame, report))
    }
}

/// Where [`apply_pipeline`] gets its config from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    Inline(PipelineConfig),
    /// A JSON file holding an array of instructions.
    Path(PathBuf),
}

impl From<PipelineConfig> for ConfigSource {
    fn from(config: PipelineConfig) -> Self {
        Self::Inline(config)
    }
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ConfigSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for ConfigSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// Run a config with built-in functions only and default options.
pub fn apply_pipeline(frame: Frame, config: impl Into<ConfigSource>) -> PipelineResult<Frame> {
    let config = match config.into() {
        ConfigSource::Inline(config) => config,
        ConfigSource::Path(path) => PipelineConfig::from_path(path)?,
    };
    Pipeline::new(config).run(frame)
}

fn emit(observer: Option<&dyn PipelineObserver>, event: PipelineEvent) {
    if let Some(observer) = observer {
        observer.on_event(&event);
    }
}
