use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::Table;
use crate::error::SchemaError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a numeric table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one sample per row (simulator export)
/// * `.json`    – `[{ "Freq [GHz]": 2.4, "S21_dB": -1.2, ... }, ...]`
/// * `.parquet` – flat numeric columns
///
/// Cells that are not numbers become NaN.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(SchemaError::UnsupportedFormat(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.headers,
        path.display()
    );
    Ok(table)
}

/// Strip whitespace and a leading byte-order mark from a column name.
pub fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

/// Coerce a text cell to a number; anything unparseable is missing.
pub fn parse_cell(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(clean_header)
        .collect();

    let mut table = Table::new(headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.push_row(record.iter().map(parse_cell).collect());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`). Columns are taken
/// in order of first appearance across all records.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            let name = clean_header(key);
            if !headers.contains(&name) {
                headers.push(name);
            }
        }
    }

    let mut table = Table::new(headers);
    for rec in records {
        let mut row = vec![f64::NAN; table.headers.len()];
        if let Some(obj) = rec.as_object() {
            for (key, val) in obj {
                if let Some(idx) = table.column_index(&clean_header(key)) {
                    row[idx] = json_to_f64(val);
                }
            }
        }
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_f64(val: &JsonValue) -> f64 {
    match val {
        JsonValue::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        JsonValue::String(s) => parse_cell(s),
        _ => f64::NAN,
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per table column.
///
/// Float and integer columns are widened to `f64`; string columns are parsed
/// like CSV cells; nulls and any other type become NaN. Works with files
/// written by both **Pandas** and **Polars**.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| clean_header(f.name()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = Table::new(headers);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns: Vec<Vec<f64>> = batch
            .columns()
            .iter()
            .map(column_to_f64)
            .collect();
        for row in 0..batch.num_rows() {
            table.push_row(columns.iter().map(|c| c[row]).collect());
        }
    }
    Ok(table)
}

/// Widen a scalar Arrow column to `f64`, NaN for nulls and unsupported types.
fn column_to_f64(col: &Arc<dyn Array>) -> Vec<f64> {
    let n = col.len();
    match col.data_type() {
        DataType::Float64 => match col.as_any().downcast_ref::<Float64Array>() {
            Some(arr) => arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect(),
            None => vec![f64::NAN; n],
        },
        DataType::Float32 => match col.as_any().downcast_ref::<Float32Array>() {
            Some(arr) => arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect(),
            None => vec![f64::NAN; n],
        },
        DataType::Int64 => match col.as_any().downcast_ref::<Int64Array>() {
            Some(arr) => arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)).collect(),
            None => vec![f64::NAN; n],
        },
        DataType::Int32 => match col.as_any().downcast_ref::<Int32Array>() {
            Some(arr) => arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect(),
            None => vec![f64::NAN; n],
        },
        DataType::Utf8 => match col.as_any().downcast_ref::<StringArray>() {
            Some(arr) => arr.iter().map(|v| v.map_or(f64::NAN, parse_cell)).collect(),
            None => vec![f64::NAN; n],
        },
        DataType::LargeUtf8 => col
            .as_string::<i64>()
            .iter()
            .map(|v| v.map_or(f64::NAN, parse_cell))
            .collect(),
        other => {
            log::warn!("Unsupported parquet column type {other:?}; treating as missing");
            vec![f64::NAN; n]
        }
    }
}
