use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset};

/// Extensions offered in the open dialog, grouped by label.
pub const SUPPORTED_EXTENSIONS: &[(&str, &[&str])] = &[
    ("Excel", &["xlsx", "xlsm", "xlsb", "xls"]),
    ("OpenDocument", &["ods"]),
    ("CSV", &["csv"]),
    ("JSON", &["json"]),
    ("Parquet", &["parquet", "pq"]),
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tabular dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xls` / `.ods` – first sheet, first row is the header
/// * `.csv`     – header row with column names
/// * `.json`    – `[{ "Nama": "...", ... }, ...]`
/// * `.parquet` – any flat schema; every field becomes a column
pub fn load_file(path: &Path) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_spreadsheet(path),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    if dataset.columns().is_empty() {
        bail!("{} has no columns", path.display());
    }
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the first worksheet. The first non-empty row holds the column labels.
fn load_spreadsheet(path: &Path) -> Result<Dataset> {
    let mut workbook = open_workbook_auto(path).context("opening spreadsheet")?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("workbook contains no sheets")?;
    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("reading sheet '{sheet}'"))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .map(|c| spreadsheet_cell(c).to_plain_string())
            .collect(),
        None => bail!("sheet '{sheet}' is empty"),
    };

    let body = rows
        .map(|cells| cells.iter().map(spreadsheet_cell).collect())
        .collect();

    Ok(Dataset::new(header, body))
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::Date(ndt.to_string()),
            None => CellValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::Error(e) => CellValue::String(format!("#{e:?}")),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one record per row.
fn load_csv(path: &Path) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(Dataset::new(headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "ID": 1, "Nama": "Budi Santoso" },
///   ...
/// ]
/// ```
///
/// Columns are ordered by first appearance; keys missing from a record
/// become `Null`.
fn load_json(path: &Path) -> Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(Dataset::new(columns, rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file. Every top-level field becomes a column.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Row {row}: failed to read cell"))?;
            rows.push(cells);
        }
    }

    Ok(Dataset::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        DataType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        DataType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            i64::try_from(v).map_or(CellValue::Float(v as f64), CellValue::Integer)
        }
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            CellValue::Date(array_value_to_string(col, row)?)
        }
        _ => CellValue::String(array_value_to_string(col, row)?),
    };
    Ok(value)
}

/// Count cells per column that are `Null`, used for the preview summary.
pub fn null_counts(dataset: &Dataset) -> BTreeMap<String, usize> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let n = dataset
                .rows()
                .iter()
                .filter(|row| row[idx] == CellValue::Null)
                .count();
            (col.clone(), n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_keeps_column_and_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "names.csv", "ID,Nama,Skor\n1,Budi,3.5\n2,Siti,\n");
        let ds = load_file(&path).unwrap();

        assert_eq!(ds.columns(), ["ID", "Nama", "Skor"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows()[0][1], CellValue::String("Budi".into()));
        assert_eq!(ds.rows()[0][2], CellValue::Float(3.5));
        assert_eq!(ds.rows()[1][2], CellValue::Null);
    }

    #[test]
    fn json_columns_follow_first_appearance() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "names.json",
            r#"[{"Nama": "Budi", "ID": 1}, {"ID": 2, "Kota": "Bandung"}]"#,
        );
        let ds = load_file(&path).unwrap();

        assert_eq!(ds.columns(), ["Nama", "ID", "Kota"]);
        assert_eq!(ds.rows()[1][0], CellValue::Null);
        assert_eq!(ds.rows()[1][2], CellValue::String("Bandung".into()));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "bad.json", r#"{"Nama": "Budi"}"#);
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("names.txt")).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn every_offered_extension_has_a_reader() {
        for (_, exts) in SUPPORTED_EXTENSIONS {
            for ext in *exts {
                let path = std::path::PathBuf::from(format!("missing.{ext}"));
                let err = load_file(&path).unwrap_err();
                assert!(
                    !err.to_string().contains("Unsupported file extension"),
                    "{ext} is offered but not loadable"
                );
            }
        }
        assert!(SUPPORTED_EXTENSIONS.iter().any(|(_, exts)| exts.contains(&"xlsb")));
    }

    #[test]
    fn garbage_xlsx_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "broken.xlsx", "not a zip archive");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn null_counts_per_column() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Null, CellValue::Integer(1)],
                vec![CellValue::Null, CellValue::Null],
            ],
        );
        let counts = null_counts(&ds);
        assert_eq!(counts["a"], 2);
        assert_eq!(counts["b"], 1);
    }
}
