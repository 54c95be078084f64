use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use crate::data::detect::find_name_column;
use crate::data::loader::null_counts;
use crate::data::model::Dataset;
use crate::data::summary::GenderDistribution;
use crate::pipeline::PredictionRun;
use crate::predict::batch::ProgressEvent;
use crate::worker::WorkerMsg;

/// Rows shown in the preview table before a run.
pub const PREVIEW_ROWS: usize = 5;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

/// Live view of the run in progress.
pub struct ActiveRun {
    rx: Receiver<WorkerMsg>,
    /// Completed fraction for the progress bar.
    pub progress: f32,
    pub completed_batches: usize,
    pub total_batches: usize,
    pub elapsed: Duration,
}

/// Figures of the last successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rows: usize,
    pub batches: usize,
    pub elapsed: Duration,
    pub distribution: GenderDistribution,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until user loads a file). Replaced by the
    /// enriched dataset after a successful run.
    pub dataset: Option<Dataset>,

    /// File the dataset came from.
    pub source_path: Option<PathBuf>,

    /// Column found by keyword detection, if any.
    pub detected_column: Option<String>,

    /// Column the user confirmed or picked.
    pub selected_column: Option<String>,

    /// Empty cells per column of the current dataset.
    pub null_counts: BTreeMap<String, usize>,

    /// Set while the worker thread is running.
    pub active_run: Option<ActiveRun>,

    /// Present once the dataset carries predictions.
    pub last_run: Option<RunSummary>,

    /// Status / error message shown in the UI.
    pub status_message: Option<StatusMessage>,
}

impl AppState {
    /// Ingest a newly loaded dataset and pre-select the detected name column.
    pub fn set_dataset(&mut self, dataset: Dataset, path: &Path) {
        self.detected_column = find_name_column(dataset.columns()).map(str::to_string);
        self.selected_column = self.detected_column.clone();
        self.status_message = Some(match &self.detected_column {
            Some(col) => StatusMessage::new(
                StatusKind::Success,
                format!("Detected name column '{col}'"),
            ),
            None => {
                log::warn!("no 'nama'/'name' column in {}", path.display());
                StatusMessage::new(
                    StatusKind::Warning,
                    "No 'Nama' or 'Name' column found. Please pick the name column manually.",
                )
            }
        });

        self.null_counts = null_counts(&dataset);
        self.dataset = Some(dataset);
        self.source_path = Some(path.to_path_buf());
        self.last_run = None;
    }

    /// Report a file that could not be loaded. The previous dataset is dropped.
    pub fn set_load_error(&mut self, message: String) {
        self.dataset = None;
        self.source_path = None;
        self.detected_column = None;
        self.selected_column = None;
        self.null_counts.clear();
        self.last_run = None;
        self.set_status(StatusKind::Error, message);
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status_message = Some(StatusMessage::new(kind, text));
    }

    pub fn is_running(&self) -> bool {
        self.active_run.is_some()
    }

    /// A run may start when a dataset and a valid column are chosen and no
    /// other run is active.
    pub fn can_run(&self) -> bool {
        !self.is_running()
            && match (&self.dataset, &self.selected_column) {
                (Some(ds), Some(col)) => ds.column_index(col).is_some(),
                _ => false,
            }
    }

    /// Predictions exist and can be exported.
    pub fn can_export(&self) -> bool {
        !self.is_running() && self.last_run.is_some()
    }

    /// Register the channel of a freshly spawned run.
    pub fn begin_run(&mut self, rx: Receiver<WorkerMsg>) {
        self.active_run = Some(ActiveRun {
            rx,
            progress: 0.0,
            completed_batches: 0,
            total_batches: 0,
            elapsed: Duration::ZERO,
        });
        self.set_status(StatusKind::Info, "Starting prediction…");
    }

    /// Drain pending worker messages. Returns `true` if anything changed.
    pub fn poll_worker(&mut self) -> bool {
        let mut changed = false;
        loop {
            let Some(run) = &self.active_run else {
                return changed;
            };
            match run.rx.try_recv() {
                Ok(msg) => {
                    self.apply(msg);
                    changed = true;
                }
                Err(TryRecvError::Empty) => return changed,
                Err(TryRecvError::Disconnected) => {
                    self.active_run = None;
                    self.set_status(StatusKind::Error, "Prediction worker stopped unexpectedly");
                    return true;
                }
            }
        }
    }

    fn apply(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::Connecting => {
                self.set_status(StatusKind::Info, "Connecting to the prediction service…");
            }
            WorkerMsg::Progress(event) => self.apply_progress(event),
            WorkerMsg::Finished(result) => {
                self.active_run = None;
                match *result {
                    Ok(run) => self.finish_run(run),
                    Err(e) => self.set_status(StatusKind::Error, format!("Prediction failed: {e}")),
                }
            }
        }
    }

    fn apply_progress(&mut self, event: ProgressEvent) {
        let fraction = event.fraction();
        let status = match event {
            ProgressEvent::BatchStarted { span, total } => {
                if let Some(run) = &mut self.active_run {
                    run.total_batches = total;
                }
                format!(
                    "Processing batch {} of {} (rows {}–{})…",
                    span.index + 1,
                    total,
                    span.start + 1,
                    span.end
                )
            }
            ProgressEvent::BatchCompleted {
                completed,
                total,
                elapsed,
            } => {
                if let Some(run) = &mut self.active_run {
                    run.completed_batches = completed;
                    run.total_batches = total;
                    run.elapsed = elapsed;
                }
                format!(
                    "Batch {completed} of {total} done ({:.1}s)",
                    elapsed.as_secs_f64()
                )
            }
        };
        if let Some(run) = &mut self.active_run {
            run.progress = run.progress.max(fraction);
        }
        self.set_status(StatusKind::Info, status);
    }

    fn finish_run(&mut self, run: PredictionRun) {
        self.set_status(
            StatusKind::Success,
            format!(
                "Processed {} rows in {:.2} seconds",
                run.rows,
                run.elapsed.as_secs_f64()
            ),
        );
        self.last_run = Some(RunSummary {
            rows: run.rows,
            batches: run.batches,
            elapsed: run.elapsed,
            distribution: run.distribution,
        });
        self.null_counts = null_counts(&run.dataset);
        self.dataset = Some(run.dataset);
    }

    /// Rows to show in the table: a short preview before predictions exist,
    /// everything afterwards.
    pub fn visible_rows(&self) -> usize {
        match (&self.dataset, &self.last_run) {
            (Some(ds), Some(_)) => ds.len(),
            (Some(ds), None) => ds.len().min(PREVIEW_ROWS),
            (None, _) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::CellValue;
    use crate::pipeline::PipelineError;
    use crate::predict::batch::BatchSpan;
    use std::sync::mpsc;

    fn names_dataset(columns: &[&str], rows: usize) -> Dataset {
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            (0..rows)
                .map(|i| columns.iter().map(|_| CellValue::Integer(i as i64)).collect())
                .collect(),
        )
    }

    #[test]
    fn detected_column_is_preselected() {
        let mut state = AppState::default();
        state.set_dataset(names_dataset(&["ID", "Name", "Score"], 2), Path::new("a.xlsx"));
        assert_eq!(state.selected_column.as_deref(), Some("Name"));
        assert!(state.can_run());
        assert_eq!(state.status_message.as_ref().unwrap().kind, StatusKind::Success);
    }

    #[test]
    fn missing_column_requires_manual_choice() {
        let mut state = AppState::default();
        state.set_dataset(names_dataset(&["ID", "Full_Name"], 2), Path::new("a.xlsx"));
        assert!(state.selected_column.is_none());
        assert!(!state.can_run());
        assert_eq!(state.status_message.as_ref().unwrap().kind, StatusKind::Warning);

        state.selected_column = Some("Full_Name".into());
        assert!(state.can_run());
    }

    #[test]
    fn progress_and_failure_leave_dataset_untouched() {
        let mut state = AppState::default();
        let original = names_dataset(&["Nama"], 7);
        state.set_dataset(original.clone(), Path::new("a.csv"));

        let (tx, rx) = mpsc::channel();
        state.begin_run(rx);
        assert!(!state.can_run());

        tx.send(WorkerMsg::Progress(ProgressEvent::BatchStarted {
            span: BatchSpan { index: 0, start: 0, end: 5 },
            total: 2,
        }))
        .unwrap();
        tx.send(WorkerMsg::Progress(ProgressEvent::BatchCompleted {
            completed: 1,
            total: 2,
            elapsed: Duration::from_millis(10),
        }))
        .unwrap();
        assert!(state.poll_worker());
        let run = state.active_run.as_ref().unwrap();
        assert_eq!((run.completed_batches, run.total_batches), (1, 2));
        assert!((run.progress - 0.5).abs() < f32::EPSILON);

        tx.send(WorkerMsg::Finished(Box::new(Err(PipelineError::Worker("boom".into())))))
            .unwrap();
        state.poll_worker();
        assert!(!state.is_running());
        assert_eq!(state.dataset.as_ref(), Some(&original));
        assert!(state.last_run.is_none());
        assert_eq!(state.status_message.as_ref().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn dropped_worker_is_reported() {
        let mut state = AppState::default();
        let (tx, rx) = mpsc::channel::<WorkerMsg>();
        state.begin_run(rx);
        drop(tx);
        assert!(state.poll_worker());
        assert!(!state.is_running());
    }

    #[test]
    fn empty_cells_are_counted_on_load() {
        let mut state = AppState::default();
        let ds = Dataset::new(
            vec!["Nama".into()],
            vec![vec![CellValue::Null], vec![CellValue::String("Ani".into())]],
        );
        state.set_dataset(ds, Path::new("a.csv"));
        assert_eq!(state.null_counts.get("Nama"), Some(&1));

        state.set_load_error("bad file".into());
        assert!(state.null_counts.is_empty());
        assert!(state.dataset.is_none());
    }

    #[test]
    fn preview_is_limited_until_predictions_exist() {
        let mut state = AppState::default();
        state.set_dataset(names_dataset(&["Nama"], 20), Path::new("a.csv"));
        assert_eq!(state.visible_rows(), PREVIEW_ROWS);
    }
}
