use std::num::NonZeroUsize;
use std::ops::Range;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::{AccumulatedResults, PredictError, Predictor};

/// Names per inference call unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(5000) {
    Some(n) => n,
    None => unreachable!(),
};

// ---------------------------------------------------------------------------
// Batch planning
// ---------------------------------------------------------------------------

/// A contiguous slice `start..end` of the name list, submitted in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSpan {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl BatchSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `0..n` into `ceil(n / batch_size)` spans in order.
///
/// Every span holds `batch_size` rows except possibly the last one.
pub fn plan_batches(n: usize, batch_size: NonZeroUsize) -> Vec<BatchSpan> {
    let size = batch_size.get();
    (0..n.div_ceil(size))
        .map(|index| BatchSpan {
            index,
            start: index * size,
            end: ((index + 1) * size).min(n),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Progress and errors
// ---------------------------------------------------------------------------

/// Side-channel notifications emitted while the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// About to submit `span`; `total` batches in this run.
    BatchStarted { span: BatchSpan, total: usize },
    /// `completed` of `total` batches have returned successfully.
    BatchCompleted {
        completed: usize,
        total: usize,
        elapsed: Duration,
    },
}

impl ProgressEvent {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        match *self {
            ProgressEvent::BatchStarted { span, total } => span.index as f32 / total.max(1) as f32,
            ProgressEvent::BatchCompleted { completed, total, .. } => {
                completed as f32 / total.max(1) as f32
            }
        }
    }
}

/// Why a single batch failed.
#[derive(Debug, Error)]
pub enum BatchFailure {
    #[error(transparent)]
    Predict(#[from] PredictError),

    #[error("expected {expected} predictions, got {labels} labels and {confidences} confidences")]
    LengthMismatch {
        expected: usize,
        labels: usize,
        confidences: usize,
    },
}

/// A failed run. Rows are reported 1-based for the user, the fields are
/// 0-based with an exclusive `end`.
#[derive(Debug, Error)]
#[error("batch {} of {total} (rows {}–{end}) failed: {source}", .index + 1, .start + 1)]
pub struct BatchError {
    pub index: usize,
    pub total: usize,
    pub start: usize,
    pub end: usize,
    #[source]
    pub source: BatchFailure,
}

impl BatchError {
    pub fn rows(&self) -> Range<usize> {
        self.start..self.end
    }
}

// ---------------------------------------------------------------------------
// Submission loop
// ---------------------------------------------------------------------------

/// Results of a run where every batch succeeded.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub results: AccumulatedResults,
    pub batches: usize,
    pub elapsed: Duration,
}

/// Drives the sequential batch loop against a [`Predictor`].
#[derive(Debug, Clone, Copy)]
pub struct BatchSubmitter {
    batch_size: NonZeroUsize,
}

impl Default for BatchSubmitter {
    fn default() -> Self {
        BatchSubmitter::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchSubmitter {
    pub fn new(batch_size: NonZeroUsize) -> Self {
        BatchSubmitter { batch_size }
    }

    pub fn batch_size(&self) -> NonZeroUsize {
        self.batch_size
    }

    /// Submit `names` batch by batch, strictly in order.
    ///
    /// Stops at the first failing batch; nothing accumulated so far is
    /// returned in that case. Batch `i + 1` is never sent before batch `i`
    /// has returned.
    pub fn run<P, F>(
        &self,
        names: &[String],
        predictor: &P,
        mut on_progress: F,
    ) -> Result<BatchOutcome, BatchError>
    where
        P: Predictor + ?Sized,
        F: FnMut(ProgressEvent),
    {
        let start = Instant::now();
        let spans = plan_batches(names.len(), self.batch_size);
        let total = spans.len();
        let mut results = AccumulatedResults::with_capacity(names.len());

        for span in spans {
            on_progress(ProgressEvent::BatchStarted { span, total });
            log::debug!(
                "submitting batch {}/{} (rows {}..{})",
                span.index + 1,
                total,
                span.start,
                span.end
            );

            let chunk = &names[span.range()];
            let prediction = predictor
                .predict_batch(chunk)
                .map_err(|e| batch_error(span, total, e.into()))?;

            if prediction.labels.len() != chunk.len() || prediction.confidences.len() != chunk.len()
            {
                return Err(batch_error(
                    span,
                    total,
                    BatchFailure::LengthMismatch {
                        expected: chunk.len(),
                        labels: prediction.labels.len(),
                        confidences: prediction.confidences.len(),
                    },
                ));
            }

            results.extend(prediction);
            on_progress(ProgressEvent::BatchCompleted {
                completed: span.index + 1,
                total,
                elapsed: start.elapsed(),
            });
        }

        Ok(BatchOutcome {
            results,
            batches: total,
            elapsed: start.elapsed(),
        })
    }
}

fn batch_error(span: BatchSpan, total: usize, source: BatchFailure) -> BatchError {
    BatchError {
        index: span.index,
        total,
        start: span.start,
        end: span.end,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::BatchPrediction;
    use std::sync::Mutex;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("name-{i}")).collect()
    }

    /// Echoes each name back as its label and records chunk sizes.
    #[derive(Default)]
    struct EchoPredictor {
        calls: Mutex<Vec<usize>>,
        fail_on_call: Option<usize>,
        short_on_call: Option<usize>,
    }

    impl Predictor for EchoPredictor {
        fn predict_batch(&self, names: &[String]) -> Result<BatchPrediction, PredictError> {
            let mut calls = self.calls.lock().unwrap();
            let call = calls.len();
            calls.push(names.len());
            if self.fail_on_call == Some(call) {
                return Err(PredictError::Remote("model crashed".into()));
            }
            let mut labels: Vec<String> = names.to_vec();
            if self.short_on_call == Some(call) {
                labels.pop();
            }
            let confidences = names.iter().map(|_| 0.9).collect();
            Ok(BatchPrediction { labels, confidences })
        }
    }

    #[test]
    fn plan_covers_range_without_gaps() {
        for n in [0, 1, 4, 5, 6, 17, 12_000] {
            for bs in [1, 3, 5, 5000] {
                let spans = plan_batches(n, nz(bs));
                assert_eq!(spans.len(), n.div_ceil(bs), "n={n} bs={bs}");
                let mut next = 0;
                for (i, span) in spans.iter().enumerate() {
                    assert_eq!(span.index, i);
                    assert_eq!(span.start, next);
                    assert!(span.len() <= bs && !span.is_empty());
                    next = span.end;
                }
                assert_eq!(next, n);
            }
        }
    }

    #[test]
    fn twelve_thousand_names_make_three_batches() {
        let predictor = EchoPredictor::default();
        let mut completed = Vec::new();
        let outcome = BatchSubmitter::new(nz(5000))
            .run(&names(12_000), &predictor, |ev| {
                if let ProgressEvent::BatchCompleted { completed: c, total, .. } = ev {
                    completed.push((c, total));
                }
            })
            .unwrap();

        assert_eq!(*predictor.calls.lock().unwrap(), [5000, 5000, 2000]);
        assert_eq!(completed, [(1, 3), (2, 3), (3, 3)]);
        assert_eq!(outcome.batches, 3);
        assert_eq!(outcome.results.len(), 12_000);
    }

    #[test]
    fn results_stay_aligned_across_batches() {
        let input = names(11);
        let outcome = BatchSubmitter::new(nz(4))
            .run(&input, &EchoPredictor::default(), |_| {})
            .unwrap();
        assert_eq!(outcome.results.labels(), input.as_slice());
        assert_eq!(outcome.results.confidences().len(), 11);
    }

    #[test]
    fn empty_input_makes_no_calls() {
        let predictor = EchoPredictor::default();
        let mut events = 0;
        let outcome = BatchSubmitter::default()
            .run(&[], &predictor, |_| events += 1)
            .unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.batches, 0);
        assert_eq!(events, 0);
        assert!(predictor.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failure_aborts_and_reports_the_range() {
        let predictor = EchoPredictor {
            fail_on_call: Some(1),
            ..Default::default()
        };
        let err = BatchSubmitter::new(nz(5))
            .run(&names(12), &predictor, |_| {})
            .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.rows(), 5..10);
        assert!(matches!(err.source, BatchFailure::Predict(PredictError::Remote(_))));
        // No further batch is attempted after the failure.
        assert_eq!(predictor.calls.lock().unwrap().len(), 2);
        assert_eq!(
            err.to_string(),
            "batch 2 of 3 (rows 6–10) failed: inference endpoint reported an error: model crashed"
        );
    }

    #[test]
    fn short_response_is_a_failure_of_that_batch() {
        let predictor = EchoPredictor {
            short_on_call: Some(2),
            ..Default::default()
        };
        let err = BatchSubmitter::new(nz(5))
            .run(&names(12), &predictor, |_| {})
            .unwrap_err();

        assert_eq!(err.rows(), 10..12);
        assert!(matches!(
            err.source,
            BatchFailure::LengthMismatch { expected: 2, labels: 1, confidences: 2 }
        ));
    }

    #[test]
    fn started_event_precedes_each_call() {
        let mut events = Vec::new();
        BatchSubmitter::new(nz(2))
            .run(&names(3), &EchoPredictor::default(), |ev| events.push(ev))
            .unwrap();

        let started: Vec<_> = events
            .iter()
            .filter_map(|ev| match ev {
                ProgressEvent::BatchStarted { span, .. } => Some(span.range()),
                _ => None,
            })
            .collect();
        assert_eq!(started, [0..2, 2..3]);
        assert!(matches!(events[0], ProgressEvent::BatchStarted { .. }));
        assert!(matches!(events[1], ProgressEvent::BatchCompleted { completed: 1, .. }));
    }
}
