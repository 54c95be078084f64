//! Remote gender inference.
//!
//! The batching loop in [`batch`] only talks to the [`Predictor`] trait; the
//! Hugging Face Space client in [`client`] is one implementation, tests use
//! in-memory fakes.

pub mod batch;
pub mod client;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Predictor capability
// ---------------------------------------------------------------------------

/// One synchronous inference call over a chunk of names.
pub trait Predictor: Send + Sync {
    /// Predict a label and a confidence for every name, in input order.
    fn predict_batch(&self, names: &[String]) -> Result<BatchPrediction, PredictError>;
}

impl<P: Predictor + ?Sized> Predictor for std::sync::Arc<P> {
    fn predict_batch(&self, names: &[String]) -> Result<BatchPrediction, PredictError> {
        (**self).predict_batch(names)
    }
}

/// Source of a ready [`Predictor`], connecting on first use if needed.
pub trait PredictorProvider: Send + Sync {
    fn predictor(&self) -> Result<std::sync::Arc<dyn Predictor>, PredictError>;
}

/// Raw output of one inference call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchPrediction {
    pub labels: Vec<String>,
    pub confidences: Vec<f64>,
}

/// Errors raised by a [`Predictor`].
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("could not connect to inference endpoint {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("inference endpoint reported an error: {0}")]
    Remote(String),

    #[error("malformed inference response: {0}")]
    MalformedResponse(String),
}

// ---------------------------------------------------------------------------
// Accumulated results
// ---------------------------------------------------------------------------

/// Labels and confidences of all completed batches, in global row order.
///
/// Both vectors only grow, and always have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedResults {
    labels: Vec<String>,
    confidences: Vec<f64>,
}

impl AccumulatedResults {
    pub fn with_capacity(n: usize) -> Self {
        AccumulatedResults {
            labels: Vec::with_capacity(n),
            confidences: Vec::with_capacity(n),
        }
    }

    /// Append one batch. The caller has already checked both sides are the
    /// same length.
    pub(crate) fn extend(&mut self, batch: BatchPrediction) {
        debug_assert_eq!(batch.labels.len(), batch.confidences.len());
        self.labels.extend(batch.labels);
        self.confidences.extend(batch.confidences);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn confidences(&self) -> &[f64] {
        &self.confidences
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<f64>) {
        (self.labels, self.confidences)
    }
}
