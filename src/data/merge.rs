use thiserror::Error;

use super::label::normalize_label;
use super::model::{CellValue, Dataset};
use crate::predict::AccumulatedResults;

/// Column receiving the normalized gender label.
pub const GENDER_COLUMN: &str = "pred_gender";
/// Column receiving the model confidence.
pub const CONFIDENCE_COLUMN: &str = "confidence_score";

#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error("cannot merge {predictions} predictions into {rows} rows")]
    LengthMismatch { rows: usize, predictions: usize },
}

/// Attach predictions to the dataset by position.
///
/// Row `i` receives `labels[i]` (normalized) and `confidences[i]`. The
/// prediction count must equal the row count exactly; nothing is truncated
/// or padded.
pub fn merge_predictions(
    mut dataset: Dataset,
    results: AccumulatedResults,
) -> Result<Dataset, MergeError> {
    if results.len() != dataset.len() {
        return Err(MergeError::LengthMismatch {
            rows: dataset.len(),
            predictions: results.len(),
        });
    }

    let (labels, confidences) = results.into_parts();
    let labels = labels
        .iter()
        .map(|l| CellValue::String(normalize_label(l)))
        .collect();
    let confidences = confidences.into_iter().map(CellValue::Float).collect();

    dataset.set_column(GENDER_COLUMN, labels);
    dataset.set_column(CONFIDENCE_COLUMN, confidences);
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::BatchPrediction;

    fn names(n: usize) -> Dataset {
        Dataset::new(
            vec!["ID".into(), "Nama".into()],
            (0..n)
                .map(|i| vec![CellValue::Integer(i as i64), CellValue::String(format!("n{i}"))])
                .collect(),
        )
    }

    fn results(labels: &[&str]) -> AccumulatedResults {
        let mut acc = AccumulatedResults::default();
        acc.extend(BatchPrediction {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            confidences: (0..labels.len()).map(|i| i as f64 / 10.0).collect(),
        });
        acc
    }

    #[test]
    fn appends_two_columns_and_keeps_rows() {
        let merged = merge_predictions(names(4), results(&["M", "F", "M", "X"])).unwrap();

        assert_eq!(merged.columns(), ["ID", "Nama", GENDER_COLUMN, CONFIDENCE_COLUMN]);
        assert_eq!(merged.len(), 4);
        let genders: Vec<String> = merged.column_as_strings(GENDER_COLUMN).unwrap();
        assert_eq!(genders, ["Laki-laki", "Perempuan", "Laki-laki", "X"]);
        assert_eq!(merged.rows()[3][3], CellValue::Float(0.3));
        assert_eq!(merged.rows()[2][1], CellValue::String("n2".into()));
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = merge_predictions(names(3), results(&["M", "F"])).unwrap_err();
        assert_eq!(err, MergeError::LengthMismatch { rows: 3, predictions: 2 });
    }

    #[test]
    fn existing_prediction_columns_are_overwritten() {
        let first = merge_predictions(names(2), results(&["M", "M"])).unwrap();
        let second = merge_predictions(first, results(&["F", "F"])).unwrap();

        assert_eq!(second.columns().len(), 4);
        assert_eq!(
            second.column_as_strings(GENDER_COLUMN).unwrap(),
            ["Perempuan", "Perempuan"]
        );
    }
}
