//! Background execution of one prediction run.
//!
//! The UI thread hands a [`RunJob`] to [`spawn_run`] and drains the returned
//! channel every frame. The worker owns its copy of the dataset for the whole
//! run; nothing else reads or writes it until `Finished` arrives.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::data::model::Dataset;
use crate::pipeline::{PipelineError, PredictionRun, run_prediction};
use crate::predict::PredictorProvider;
use crate::predict::batch::{BatchSubmitter, ProgressEvent};

/// Input of one run.
#[derive(Debug, Clone)]
pub struct RunJob {
    pub dataset: Dataset,
    pub name_column: String,
    pub batch_size: NonZeroUsize,
}

/// Messages from the worker to the UI, in emission order.
#[derive(Debug)]
pub enum WorkerMsg {
    /// Connecting to (or reusing) the inference endpoint.
    Connecting,
    Progress(ProgressEvent),
    /// Always the last message of a run.
    Finished(Box<Result<PredictionRun, PipelineError>>),
}

/// Start a run on its own thread.
///
/// `notify` is called after every message so the UI can schedule a repaint.
pub fn spawn_run<N>(
    provider: Arc<dyn PredictorProvider>,
    job: RunJob,
    notify: N,
) -> Receiver<WorkerMsg>
where
    N: Fn() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("gender-predict".into())
        .spawn({
            let tx = tx.clone();
            move || {
                let result = execute(provider.as_ref(), job, &tx, &notify);
                if let Err(e) = &result {
                    log::error!("prediction run failed: {e}");
                }
                let _ = tx.send(WorkerMsg::Finished(Box::new(result)));
                notify();
            }
        });

    if let Err(e) = spawned {
        log::error!("could not start worker thread: {e}");
        let _ = tx.send(WorkerMsg::Finished(Box::new(Err(PipelineError::Worker(
            e.to_string(),
        )))));
    }
    rx
}

fn execute<N: Fn()>(
    provider: &dyn PredictorProvider,
    job: RunJob,
    tx: &Sender<WorkerMsg>,
    notify: &N,
) -> Result<PredictionRun, PipelineError> {
    let _ = tx.send(WorkerMsg::Connecting);
    notify();
    let predictor = provider.predictor().map_err(PipelineError::Connect)?;

    let submitter = BatchSubmitter::new(job.batch_size);
    run_prediction(
        job.dataset,
        &job.name_column,
        &submitter,
        predictor.as_ref(),
        |event| {
            let _ = tx.send(WorkerMsg::Progress(event));
            notify();
        },
    )
}
