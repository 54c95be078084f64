use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the loaded sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet cell types.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so CellValue can live in ordered collections --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

/// Display form used by the result table.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) if is_whole(*v) => write!(f, "{}", *v as i64),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    /// Plain text form sent to the inference endpoint.
    ///
    /// Unlike `Display`, floats keep their full precision and whole floats
    /// drop the fractional part (`42.0` → `"42"`).
    pub fn to_plain_string(&self) -> String {
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(v) if is_whole(*v) => format!("{}", *v as i64),
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Null => String::new(),
        }
    }
}

/// Whole floats small enough to print as integers without rounding.
fn is_whole(v: f64) -> bool {
    v.fract() == 0.0 && v.abs() < 1e15
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// An ordered table: named columns plus rows of positional cells.
///
/// Invariants: column labels are unique, every row holds exactly
/// `columns.len()` cells, and row order never changes after loading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Dataset {
    /// Build a dataset from a header and rows.
    ///
    /// Short rows are padded with `Null`, long rows are truncated to the
    /// header width. Duplicate or empty header labels get a numeric suffix
    /// (`Name`, `Name.1`, …) so every column stays addressable.
    pub fn new(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns = dedupe_labels(header);
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Null);
                row
            })
            .collect();
        Dataset { columns, rows }
    }

    /// Ordered column labels.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows in load order.
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Borrow one column's cells in row order.
    pub fn column(&self, column: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Text form of one column, one entry per row.
    pub fn column_as_strings(&self, column: &str) -> Option<Vec<String>> {
        self.column(column)
            .map(|cells| cells.map(CellValue::to_plain_string).collect())
    }

    /// Set a whole column.
    ///
    /// An existing column keeps its position and gets its values replaced,
    /// a new column is appended at the end. `values` must have one entry per
    /// row; callers check that first.
    pub fn set_column(&mut self, column: &str, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(column) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(column.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// First `n` rows, for the preview table.
    pub fn head(&self, n: usize) -> &[Vec<CellValue>] {
        &self.rows[..n.min(self.rows.len())]
    }
}

fn dedupe_labels(header: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(header.len());
    for (i, label) in header.into_iter().enumerate() {
        let base = if label.trim().is_empty() {
            format!("Unnamed: {i}")
        } else {
            label
        };
        let mut candidate = base.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}.{n}");
            n += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec!["ID".into(), "Nama".into()],
            vec![
                vec![CellValue::Integer(1), CellValue::String("Budi".into())],
                vec![CellValue::Integer(2), CellValue::String("Siti".into())],
            ],
        )
    }

    #[test]
    fn set_column_appends_new_column() {
        let mut ds = sample();
        ds.set_column("score", vec![CellValue::Float(0.5), CellValue::Float(0.9)]);
        assert_eq!(ds.columns(), ["ID", "Nama", "score"]);
        assert_eq!(ds.rows()[1][2], CellValue::Float(0.9));
    }

    #[test]
    fn set_column_replaces_existing_in_place() {
        let mut ds = sample();
        ds.set_column("ID", vec![CellValue::Integer(10), CellValue::Integer(20)]);
        assert_eq!(ds.columns(), ["ID", "Nama"]);
        assert_eq!(ds.rows()[0][0], CellValue::Integer(10));
    }

    #[test]
    fn ragged_rows_are_normalised_to_header_width() {
        let ds = Dataset::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![CellValue::Integer(1)],
                vec![CellValue::Integer(1), CellValue::Integer(2), CellValue::Integer(3)],
            ],
        );
        assert!(ds.rows().iter().all(|r| r.len() == 2));
        assert_eq!(ds.rows()[0][1], CellValue::Null);
    }

    #[test]
    fn duplicate_and_blank_labels_are_renamed() {
        let ds = Dataset::new(vec!["Name".into(), "Name".into(), " ".into()], Vec::new());
        assert_eq!(ds.columns(), ["Name", "Name.1", "Unnamed: 2"]);
    }

    #[test]
    fn plain_string_drops_trailing_zero_fraction() {
        assert_eq!(CellValue::Float(42.0).to_plain_string(), "42");
        assert_eq!(CellValue::Float(1.25).to_plain_string(), "1.25");
        assert_eq!(CellValue::Null.to_plain_string(), "");
    }

    #[test]
    fn table_text_drops_fraction_of_whole_floats() {
        assert_eq!(CellValue::Float(1.0).to_string(), "1");
        assert_eq!(CellValue::Float(-3.0).to_string(), "-3");
        assert_eq!(CellValue::Float(0.97).to_string(), "0.9700");
        assert_eq!(CellValue::Float(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn column_as_strings_follows_row_order() {
        let ds = sample();
        assert_eq!(ds.column_as_strings("Nama").unwrap(), ["Budi", "Siti"]);
        assert!(ds.column_as_strings("missing").is_none());
    }
}
