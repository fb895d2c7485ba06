use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, SampleTable};

/// Column names in source order plus one cell map per row.
pub type RawTable = (Vec<String>, Vec<BTreeMap<String, MetadataValue>>);

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and validate a sample sheet.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one sample per record (also the fallback)
/// * `.json`    – `[{ "sample_id": "S1", "condition": "treated", ... }, ...]`
/// * `.parquet` – one flat column per field
///
/// A schema without the required columns fails with a
/// [`ValidationError`](super::model::ValidationError) that callers can
/// recover with `downcast_ref`.
pub fn load_file(path: &Path) -> Result<SampleTable> {
    let (columns, rows) = read_file(path)?;
    Ok(SampleTable::from_rows(columns, rows)?)
}

/// Read a sample sheet into untyped rows without checking its schema.
pub fn read_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (columns, rows) = match ext.as_str() {
        "parquet" | "pq" => read_parquet(path)?,
        "json" => read_json(path)?,
        _ => read_csv(path)?,
    };
    log::debug!("{}: {} rows, columns {:?}", path.display(), rows.len(), columns);

    Ok((columns, rows))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;
    read_csv_from(reader)
}

fn read_csv_from<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RawTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row: BTreeMap<String, MetadataValue> = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), MetadataValue::guess(value)))
            .collect();
        rows.push(row);
    }

    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// JSON reader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Columns are the union of keys in first-appearance order
/// (`serde_json` is built with `preserve_order`).
fn read_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading JSON {}", path.display()))?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<RawTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            row.insert(key.clone(), json_to_metadata(val));
        }
        rows.push(row);
    }

    Ok((columns, rows))
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), including `category` / `Categorical`
/// columns, which arrive dictionary-encoded.
fn read_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening parquet file {}", path.display()))?;
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
        let arrays: Vec<ArrayRef> = batch
            .columns()
            .iter()
            .map(decode_column)
            .collect::<Result<_>>()?;
        for row in 0..batch.num_rows() {
            let cells: BTreeMap<String, MetadataValue> = columns
                .iter()
                .zip(&arrays)
                .map(|(name, col)| {
                    extract_metadata_value(col, row).map(|value| (name.clone(), value))
                })
                .collect::<Result<_>>()?;
            rows.push(cells);
        }
    }

    Ok((columns, rows))
}

/// Unpack dictionary columns to their value type and widen small numeric
/// types, so [`extract_metadata_value`] sees a handful of plain layouts.
fn decode_column(col: &ArrayRef) -> Result<ArrayRef> {
    let target = match col.data_type() {
        DataType::Dictionary(_, value_type) => value_type.as_ref().clone(),
        DataType::Int8 | DataType::Int16 | DataType::UInt8 | DataType::UInt16 | DataType::UInt32 => {
            DataType::Int64
        }
        DataType::Float16 => DataType::Float64,
        _ => return Ok(Arc::clone(col)),
    };
    let decoded = cast(col, &target)
        .with_context(|| format!("decoding {} column as {target}", col.data_type()))?;
    // Dictionary values may themselves need widening.
    decode_column(&decoded)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_metadata_value(col: &ArrayRef, row: usize) -> Result<MetadataValue> {
    if col.is_null(row) {
        return Ok(MetadataValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => MetadataValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            MetadataValue::String(col.as_string::<i64>().value(row).to_string())
        }
        DataType::Utf8View => MetadataValue::String(col.as_string_view().value(row).to_string()),
        DataType::Int32 => MetadataValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => MetadataValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => {
            MetadataValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => MetadataValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => MetadataValue::Bool(col.as_boolean().value(row)),
        DataType::List(_) | DataType::LargeList(_) | DataType::Struct(_) => {
            bail!("nested column type {:?} is not supported", col.data_type())
        }
        // Dates, timestamps, decimals, UInt64: arrow's own text form.
        _ => {
            let formatter = ArrayFormatter::try_new(col.as_ref(), &FormatOptions::default())
                .with_context(|| format!("formatting {} column", col.data_type()))?;
            MetadataValue::String(formatter.value(row).to_string())
        }
    };
    Ok(value)
}
