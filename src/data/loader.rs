use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, RigDataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a rig dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, comma separated, `"` quoting (the usual export)
/// * `.json`    – `[{ "Operator": "...", "DSRE": 0.91, ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path) -> Result<RigDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("failed to load data from {}", path.display()))?;

    log::info!(
        "Loaded {} rows with {} columns from {}",
        dataset.len(),
        dataset.column_names.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RigDataset> {
    let text = std::fs::read_to_string(path).context("reading CSV file")?;
    parse_csv(&text)
}

/// Parse CSV text. Whitespace directly after a delimiter is skipped, so
/// `Operator, "Contractor, Inc"` reads the same as `Operator,"Contractor, Inc"`.
/// Short rows are padded with nulls; a row longer than the header is an error.
pub fn parse_csv(text: &str) -> Result<RigDataset> {
    let normalized = skip_initial_space(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .quote(b'"')
        .has_headers(true)
        .flexible(true)
        .from_reader(normalized.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > headers.len() {
            bail!(
                "CSV row {row_no}: expected {} fields, saw {}",
                headers.len(),
                record.len()
            );
        }
        let cells: BTreeMap<String, CellValue> = headers
            .iter()
            .enumerate()
            .map(|(i, col)| (col.clone(), record.get(i).map_or(CellValue::Null, CellValue::infer)))
            .collect();
        rows.push(cells);
    }

    Ok(RigDataset::from_rows(headers, rows))
}

/// Drop spaces and tabs that follow a delimiter outside a quoted field.
fn skip_initial_space(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_quotes = false;
    let mut after_delimiter = false;
    for ch in text.chars() {
        if after_delimiter && (ch == ' ' || ch == '\t') {
            continue;
        }
        after_delimiter = false;
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => after_delimiter = true,
            _ => {}
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<RigDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut column_names: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut cells = BTreeMap::new();
        for (key, val) in obj {
            if !column_names.contains(key) {
                column_names.push(key.clone());
            }
            cells.insert(key.clone(), json_to_cell(val));
        }
        rows.push(cells);
    }

    Ok(RigDataset::from_rows(column_names, rows))
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

/// Load a Parquet file with flat scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RigDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let column_names: Vec<String> = builder
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
            let cells: BTreeMap<String, CellValue> = column_names
                .iter()
                .zip(batch.columns())
                .map(|(name, col)| (name.clone(), extract_cell(col, row)))
                .collect();
            rows.push(cells);
        }
    }

    Ok(RigDataset::from_rows(column_names, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => float_cell(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => float_cell(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

/// Pandas writes missing floats as NaN.
fn float_cell(v: f64) -> CellValue {
    if v.is_nan() {
        CellValue::Null
    } else {
        CellValue::Float(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_skips_space_after_delimiter() {
        let text = "Operator, Contractor, DSRE\nAcme, \"Nabors, Inc\", 0.9\n";
        let ds = parse_csv(text).unwrap();
        assert_eq!(ds.column_names, vec!["Operator", "Contractor", "DSRE"]);
        let row = &ds.records[0];
        assert_eq!(row.get("Contractor"), &CellValue::String("Nabors, Inc".into()));
        assert_eq!(row.number("DSRE"), Some(0.9));
    }

    #[test]
    fn csv_empty_cells_are_null() {
        let ds = parse_csv("Operator,DSRE\nAcme,\n,0.5\n").unwrap();
        assert!(ds.records[0].get("DSRE").is_null());
        assert!(ds.records[1].get("Operator").is_null());
        assert_eq!(ds.records[1].index, 1);
    }

    #[test]
    fn csv_long_row_is_an_error() {
        let err = parse_csv("a,b\n1,2,3\n").unwrap_err();
        assert!(format!("{err:#}").contains("expected 2 fields, saw 3"));
    }

    #[test]
    fn csv_short_row_is_padded_with_nulls() {
        let ds = parse_csv("Operator,Contractor,DSRE\nAcme,Nabors\nBorealis,H&P,0.9\n").unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].get("Contractor").as_str(), Some("Nabors"));
        assert!(ds.records[0].get("DSRE").is_null());
        assert!(ds.records[0].cells.contains_key("DSRE"));
        assert_eq!(ds.records[1].number("DSRE"), Some(0.9));
    }

    #[test]
    fn csv_nan_spellings_load_as_null() {
        let ds = parse_csv("Hole_Size,DSRE,Dilution_Ratio,Discard_Ratio\n-nan,NAN,0.1,\n8.5,0.9,,\n").unwrap();
        assert!(ds.records[0].get("Hole_Size").is_null());
        assert!(ds.records[0].get("DSRE").is_null());
        assert_eq!(ds.records[1].number("Hole_Size"), Some(8.5));
    }

    #[test]
    fn nan_floats_are_null() {
        assert_eq!(float_cell(f32::NAN as f64), CellValue::Null);
        assert_eq!(float_cell(f64::NAN), CellValue::Null);
        assert_eq!(float_cell(1.5), CellValue::Float(1.5));
    }

    #[test]
    fn quoted_spaces_are_kept() {
        let ds = parse_csv("Well_Name\n\"  W-1\"\n").unwrap();
        assert_eq!(ds.records[0].get("Well_Name").as_str(), Some("  W-1"));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("rigs.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }
}
