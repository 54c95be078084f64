//! XLSX export of the enriched dataset.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::data::model::{CellValue, Dataset};

/// File name offered in the save dialog.
pub const EXPORT_FILE_NAME: &str = "Dataset_Gender_Predicted.xlsx";
/// MIME type of the exported workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Name of the single worksheet.
pub const SHEET_NAME: &str = "Hasil_Prediksi";

/// Excel worksheet maximum row count (header included).
pub const EXCEL_MAX_ROWS: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const EXCEL_MAX_COLS: usize = 16_384;
/// Largest integer magnitude a worksheet number (an `f64`) holds exactly.
pub const EXCEL_MAX_EXACT_INT: u64 = 1 << 53;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("{rows} rows × {cols} columns exceed the worksheet limit")]
    TooLarge { rows: usize, cols: usize },

    #[error("row {row}, column '{column}': {value} cannot be stored in a worksheet")]
    NonFiniteNumber {
        row: usize,
        column: String,
        value: f64,
    },

    #[error("writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A finished export, ready to be saved or handed to a download.
#[derive(Debug, Clone)]
pub struct Report {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Build the downloadable report for `dataset`.
pub fn build_report(dataset: &Dataset) -> Result<Report, ExportError> {
    Ok(Report {
        file_name: EXPORT_FILE_NAME,
        mime_type: XLSX_MIME,
        bytes: export_xlsx(dataset)?,
    })
}

/// Serialize the dataset into an in-memory `.xlsx` workbook.
///
/// One worksheet, bold header row, then one row per data row in the order
/// held in memory. The dataset is only read.
pub fn export_xlsx(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    let n_cols = dataset.columns().len();
    if dataset.len() + 1 > EXCEL_MAX_ROWS || n_cols > EXCEL_MAX_COLS {
        return Err(ExportError::TooLarge {
            rows: dataset.len(),
            cols: n_cols,
        });
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col_idx, label) in dataset.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, col_idx as u16, label, &header_format)?;
    }

    for (row_idx, row) in dataset.rows().iter().enumerate() {
        let xl_row = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let xl_col = col_idx as u16;
            match cell {
                CellValue::Null => {}
                CellValue::String(s) | CellValue::Date(s) => {
                    worksheet.write_string(xl_row, xl_col, s)?;
                }
                CellValue::Integer(i) if i.unsigned_abs() <= EXCEL_MAX_EXACT_INT => {
                    worksheet.write_number(xl_row, xl_col, *i as f64)?;
                }
                // Long IDs such as 16-digit NIKs are kept digit for digit as text.
                CellValue::Integer(i) => {
                    worksheet.write_string(xl_row, xl_col, i.to_string())?;
                }
                CellValue::Float(v) if v.is_finite() => {
                    worksheet.write_number(xl_row, xl_col, *v)?;
                }
                CellValue::Float(v) => {
                    return Err(ExportError::NonFiniteNumber {
                        row: row_idx,
                        column: dataset.columns()[col_idx].clone(),
                        value: *v,
                    });
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(xl_row, xl_col, *b)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Export and write the workbook to `path`.
pub fn write_xlsx(dataset: &Dataset, path: &Path) -> Result<(), ExportError> {
    let report = build_report(dataset)?;
    log::debug!(
        "writing {} ({} bytes, {}) to {}",
        report.file_name,
        report.bytes.len(),
        report.mime_type,
        path.display()
    );
    std::fs::write(path, report.bytes).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
