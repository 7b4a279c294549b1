use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::types::Frame;

/// Shape of the dataset at a point in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    pub rows: usize,
    pub columns: usize,
    /// `true` if the dataset is a single column rather than a table.
    pub is_column: bool,
}

impl FrameStats {
    pub fn of(frame: &Frame) -> Self {
        Self {
            rows: frame.row_count(),
            columns: frame.column_count(),
            is_column: matches!(frame, Frame::Column(_)),
        }
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = if self.is_column { "column" } else { "table" };
        write!(f, "{shape} rows={} columns={}", self.rows, self.columns)
    }
}

/// Events emitted by the pipeline executor.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted { steps: usize, input: FrameStats },
    StepStarted { step: usize, action: String },
    StepFinished {
        step: usize,
        action: String,
        output: FrameStats,
        elapsed: Duration,
    },
    /// Emitted by the `log` action.
    Logged {
        step: usize,
        message: Option<String>,
        columns: Vec<String>,
        stats: FrameStats,
    },
    StepFailed {
        step: usize,
        action: String,
        error: String,
    },
    RunFinished {
        steps: usize,
        output: FrameStats,
        elapsed: Duration,
    },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunStarted { steps, input } => write!(f, "run started steps={steps} input=({input})"),
            Self::StepStarted { step, action } => write!(f, "step {step} started action={action}"),
            Self::StepFinished {
                step,
                action,
                output,
                elapsed,
            } => write!(
                f,
                "step {step} finished action={action} output=({output}) elapsed={elapsed:?}"
            ),
            Self::Logged {
                step,
                message,
                columns,
                stats,
            } => {
                write!(f, "step {step} log ({stats}) columns={columns:?}")?;
                match message {
                    Some(message) => write!(f, " message={message}"),
                    None => Ok(()),
                }
            }
            Self::StepFailed {
                step,
                action,
                error,
            } => write!(f, "step {step} failed action={action} err={error}"),
            Self::RunFinished {
                steps,
                output,
                elapsed,
            } => write!(
                f,
                "run finished steps={steps} output=({output}) elapsed={elapsed:?}"
            ),
        }
    }
}

/// Observer hook for pipeline events.
///
/// Observers never influence execution; they only see what happened.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Writes one line per event to stderr.
#[derive(Debug, Default)]
pub struct StdErrPipelineObserver;

impl PipelineObserver for StdErrPipelineObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StepFailed { .. } => eprintln!("[pipeline][error] {event}"),
            _ => eprintln!("[pipeline] {event}"),
        }
    }
}

/// Fans events out to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_event(&self, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }
}

/// Appends pipeline events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {event}", unix_ts());
        }
    }
}

/// Pretty-printed JSON rendering of an instruction, as shown by verbose runs.
pub fn render_instruction(step: usize, instruction: &serde_json::Value) -> String {
    let body = serde_json::to_string_pretty(instruction).unwrap_or_else(|_| instruction.to_string());
    format!("[pipeline] step {step}:\n{body}")
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::{
        CompositeObserver, FileObserver, FrameStats, PipelineEvent, PipelineObserver,
        render_instruction,
    };

    #[derive(Default)]
    struct Counting {
        seen: Mutex<usize>,
    }

    impl PipelineObserver for Counting {
        fn on_event(&self, _event: &PipelineEvent) {
            *self.seen.lock().unwrap() += 1;
        }
    }

    fn stats() -> FrameStats {
        FrameStats {
            rows: 3,
            columns: 2,
            is_column: false,
        }
    }

    #[test]
    fn composite_fans_out() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let composite = CompositeObserver::new(vec![
            a.clone() as Arc<dyn PipelineObserver>,
            b.clone() as Arc<dyn PipelineObserver>,
        ]);
        composite.on_event(&PipelineEvent::RunStarted {
            steps: 1,
            input: stats(),
        });
        assert_eq!(*a.seen.lock().unwrap(), 1);
        assert_eq!(*b.seen.lock().unwrap(), 1);
    }

    #[test]
    fn events_render_on_one_line() {
        let line = PipelineEvent::Logged {
            step: 2,
            message: Some("after dedupe".to_string()),
            columns: vec!["k".to_string(), "v".to_string()],
            stats: stats(),
        }
        .to_string();
        assert_eq!(
            line,
            r#"step 2 log (table rows=3 columns=2) columns=["k", "v"] message=after dedupe"#
        );
        assert!(!line.contains('\n'));
    }

    #[test]
    fn file_observer_appends_lines() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("tabular_pipeline_events_{nanos}.log"));

        let observer = FileObserver::new(&path);
        observer.on_event(&PipelineEvent::StepStarted {
            step: 0,
            action: "select_columns".to_string(),
        });
        observer.on_event(&PipelineEvent::RunFinished {
            steps: 1,
            output: stats(),
            elapsed: Duration::from_millis(1),
        });

        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("step 0 started action=select_columns"));
    }

    #[test]
    fn instructions_render_pretty() {
        let out = render_instruction(0, &serde_json::json!({"action": "log"}));
        assert_eq!(out, "[pipeline] step 0:\n{\n  \"action\": \"log\"\n}");
    }
}
