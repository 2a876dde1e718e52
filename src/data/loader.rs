use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::model::RowCollection;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a row collection from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one record per line
/// * `.json`    – `[{ "name": "...", "pixels": "[...]", ... }, ...]`
/// * `.parquet` – one column per field, read back as text
pub fn load_file(path: &Path) -> Result<RowCollection> {
    let collection = match extension(path).as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "loaded {} rows with columns {:?} from {}",
        collection.len(),
        collection.columns,
        path.display()
    );
    Ok(collection)
}

/// Save a row collection, keeping its column order.  Dispatch by extension.
pub fn save_file(collection: &RowCollection, path: &Path) -> Result<()> {
    match extension(path).as_str() {
        "csv" => save_csv(collection, path),
        "json" => save_json(collection, path),
        "parquet" | "pq" => save_parquet(collection, path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("saving {}", path.display()))
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RowCollection> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut collection = RowCollection::new(headers.clone());

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let cells: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.to_string()))
            .collect();
        collection.push(cells);
    }

    Ok(collection)
}

fn save_csv(collection: &RowCollection, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer
        .write_record(&collection.columns)
        .context("writing CSV headers")?;
    for row in &collection.rows {
        writer
            .write_record(
                collection
                    .columns
                    .iter()
                    .map(|c| row.get(c).unwrap_or("")),
            )
            .with_context(|| format!("writing row {}", row.identity()))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON (records-oriented)
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<RowCollection> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    // Column order follows first appearance across records.
    let mut columns: Vec<String> = Vec::new();
    let mut parsed = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        let mut cells = BTreeMap::new();
        for (key, val) in obj {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
            cells.insert(key.clone(), json_to_cell(val));
        }
        parsed.push(cells);
    }

    let mut collection = RowCollection::new(columns);
    for cells in parsed {
        collection.push(cells);
    }
    Ok(collection)
}

/// Strings are taken verbatim; anything else (numbers, nested pixel lists)
/// keeps its JSON text.
fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn save_json(collection: &RowCollection, path: &Path) -> Result<()> {
    let records: Vec<JsonValue> = collection
        .rows
        .iter()
        .map(|row| {
            let obj: Map<String, JsonValue> = collection
                .columns
                .iter()
                .map(|c| {
                    (
                        c.clone(),
                        JsonValue::String(row.get(c).unwrap_or("").to_string()),
                    )
                })
                .collect();
            JsonValue::Object(obj)
        })
        .collect();
    let file = std::fs::File::create(path).context("creating JSON file")?;
    serde_json::to_writer(std::io::BufWriter::new(file), &records).context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Every column is read back as text; numeric columns written by other
/// tools are cast to their string form.
fn load_parquet(path: &Path) -> Result<RowCollection> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut collection = RowCollection::new(columns.clone());

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let text_columns: Vec<ArrayRef> = (0..batch.num_columns())
            .map(|i| {
                cast(batch.column(i), &DataType::Utf8)
                    .with_context(|| format!("column '{}' cannot be read as text", columns[i]))
            })
            .collect::<Result<_>>()?;

        for row in 0..batch.num_rows() {
            let cells: BTreeMap<String, String> = columns
                .iter()
                .zip(&text_columns)
                .map(|(name, col)| {
                    let value = if col.is_null(row) {
                        String::new()
                    } else {
                        col.as_string::<i32>().value(row).to_string()
                    };
                    (name.clone(), value)
                })
                .collect();
            collection.push(cells);
        }
    }

    Ok(collection)
}

fn save_parquet(collection: &RowCollection, path: &Path) -> Result<()> {
    let schema = Arc::new(Schema::new(
        collection
            .columns
            .iter()
            .map(|c| Field::new(c, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let arrays: Vec<ArrayRef> = collection
        .columns
        .iter()
        .map(|c| {
            let values: Vec<Option<&str>> = collection.rows.iter().map(|r| r.get(c)).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
