use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the rig table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes found in rig exports.
///
/// `Null` is an explicit state: a missing cell and an empty cell are the same
/// thing to every consumer. Integer and Float compare numerically with each
/// other, so `12` and `12.0` are one filter value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) | CellValue::Float(_) => 2,
            CellValue::String(_) => 3,
        }
    }

    /// Interpret the value as an `f64` (numeric cells only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Infer a cell from raw text the way the loaders do:
    /// null marker → Null, then integer, float, boolean, else string.
    pub fn infer(s: &str) -> CellValue {
        if is_null_marker(s) {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            // `-nan`, `NAN`, `+NaN`… parse fine but are missing values.
            return if f.is_nan() { CellValue::Null } else { CellValue::Float(f) };
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }
}

fn is_null_marker(s: &str) -> bool {
    matches!(
        s,
        "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "NULL" | "None" | "<NA>"
    )
}

// -- Manual Eq/Ord/Hash so CellValue can live in BTreeSet / HashMap keys --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CellValue::*;
        let (ra, rb) = (self.rank(), other.rank());
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Float(x), Float(y)) => cmp_floats(*x, *y),
            (Integer(i), Float(f)) => cmp_int_float(*i, *f),
            (Float(f), Integer(i)) => cmp_int_float(*i, *f).reverse(),
            _ => Ordering::Equal,
        }
    }
}

/// Total order on floats in which `-0.0 == 0.0`.
fn cmp_floats(x: f64, y: f64) -> Ordering {
    if x == y {
        Ordering::Equal
    } else {
        x.total_cmp(&y)
    }
}

/// Exact comparison of an integer against a float, no rounding through f64.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    if f.is_nan() {
        return (i as f64).total_cmp(&f);
    }
    if f >= I64_BOUND {
        return Ordering::Less;
    }
    if f < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        other => other,
    }
}

/// 2^63, the first float past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// The integer a float equals exactly, if any.
fn integral(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f)).then(|| f as i64)
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            // Integer(12) == Float(12.0), so integral floats hash as i64.
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => match integral(*f) {
                Some(i) => i.hash(state),
                None => f.to_bits().hash(state),
            },
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the rig table
// ---------------------------------------------------------------------------

static NULL: CellValue = CellValue::Null;

/// A single row: its position in the source file plus its cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Zero-based row position in the loaded file.
    pub index: usize,
    /// column_name → value. Absent columns read as `Null`.
    pub cells: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(index: usize, cells: BTreeMap<String, CellValue>) -> Self {
        Record { index, cells }
    }

    /// Cell for `column`, or `Null` when the row has no such column.
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&NULL)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).as_f64()
    }
}

// ---------------------------------------------------------------------------
// RigDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The loaded rig table. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RigDataset {
    /// All rows in file order.
    pub records: Vec<Record>,
    /// Column names in header order.
    pub column_names: Vec<String>,
}

impl RigDataset {
    /// Build a dataset from header-ordered column names and per-row cells.
    pub fn from_rows(column_names: Vec<String>, rows: Vec<BTreeMap<String, CellValue>>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| Record::new(i, cells))
            .collect();
        RigDataset {
            records,
            column_names,
        }
    }

    /// Borrowed view over every row, the input to the filter cascade.
    pub fn rows(&self) -> Vec<&Record> {
        self.records.iter().collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
