//! One prediction run: column → batches → merge → summary.

use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use crate::data::loader::load_file;
use crate::data::merge::{GENDER_COLUMN, MergeError, merge_predictions};
use crate::data::model::{CellValue, Dataset};
use crate::data::summary::GenderDistribution;
use crate::predict::batch::{BatchError, BatchSubmitter, ProgressEvent};
use crate::predict::{PredictError, Predictor};

/// Everything that can stop a run, in the two user-facing domains plus the
/// merge contract check.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not read the input file: {0}")]
    Input(String),

    #[error("column '{0}' does not exist in the dataset")]
    MissingColumn(String),

    #[error(transparent)]
    Connect(PredictError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("could not start the prediction worker: {0}")]
    Worker(String),
}

/// A finished run.
#[derive(Debug, Clone)]
pub struct PredictionRun {
    pub dataset: Dataset,
    pub distribution: GenderDistribution,
    pub rows: usize,
    pub batches: usize,
    pub elapsed: Duration,
}

/// Read the input file, keeping the loader's context chain in the message.
pub fn load_input(path: &Path) -> Result<Dataset, PipelineError> {
    load_file(path).map_err(|e| PipelineError::Input(format!("{e:#}")))
}

/// Predict genders for `name_column` and return the enriched dataset.
///
/// `dataset` is consumed; on error nothing of it is returned, so a caller
/// holding the original keeps an unmodified copy.
pub fn run_prediction<P, F>(
    dataset: Dataset,
    name_column: &str,
    submitter: &BatchSubmitter,
    predictor: &P,
    on_progress: F,
) -> Result<PredictionRun, PipelineError>
where
    P: Predictor + ?Sized,
    F: FnMut(ProgressEvent),
{
    let names = dataset
        .column_as_strings(name_column)
        .ok_or_else(|| PipelineError::MissingColumn(name_column.to_string()))?;

    log::info!(
        "predicting {} names from column '{}' in batches of {}",
        names.len(),
        name_column,
        submitter.batch_size()
    );
    let outcome = submitter.run(&names, predictor, on_progress)?;

    let rows = names.len();
    let merged = merge_predictions(dataset, outcome.results)?;
    let distribution = GenderDistribution::from_labels(
        merged
            .column(GENDER_COLUMN)
            .into_iter()
            .flatten()
            .filter_map(|cell| match cell {
                CellValue::String(s) => Some(s.as_str()),
                _ => None,
            }),
    );

    log::info!(
        "predicted {rows} rows in {} batches ({:.2}s), distribution {:?}",
        outcome.batches,
        outcome.elapsed.as_secs_f64(),
        distribution.as_label_map()
    );
    Ok(PredictionRun {
        dataset: merged,
        distribution,
        rows,
        batches: outcome.batches,
        elapsed: outcome.elapsed,
    })
}
