use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map as JsonMap, Value as JsonValue};

use super::derive::derive_features;
use super::error::{LoadError, SchemaError};
use super::model::{Record, RentalTable};

/// Name of the timestamp column unless the caller overrides it.
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "datetime";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load raw rental records from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – delimited text with a header row (the primary format)
/// * `.json`    – `[{ "datetime": "...", "season": 1, ... }, ...]`
/// * `.parquet` – scalar columns, as written by Pandas or Polars
///
/// The file is opened, read fully and closed; no handle is retained. No
/// value-range validation happens here: out-of-range season or weather
/// codes propagate unchanged.
pub fn load_file(path: &Path) -> Result<Vec<Record>, LoadError> {
    load_file_with(path, DEFAULT_TIMESTAMP_COLUMN)
}

/// Like [`load_file`] with a non-default timestamp column name.
pub fn load_file_with(path: &Path, timestamp_column: &str) -> Result<Vec<Record>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, timestamp_column),
        "json" => load_json(path, timestamp_column),
        "parquet" | "pq" => load_parquet(path, timestamp_column),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse a timestamp cell.  The dataset writes `%Y-%m-%d %H:%M:%S`; a bare
/// date means midnight.
fn parse_timestamp(value: &str, row: usize) -> Result<NaiveDateTime, LoadError> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| LoadError::Timestamp {
            row,
            value: value.to_string(),
        })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, timestamp_column: &str) -> Result<Vec<Record>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv { row: 0, source })?
        .iter()
        .map(str::to_string)
        .collect();

    let ts_idx = column_index(&headers, timestamp_column)?;
    let season_idx = column_index(&headers, "season")?;
    let weather_idx = column_index(&headers, "weather")?;
    let temp_idx = column_index(&headers, "temp")?;
    let workingday_idx = column_index(&headers, "workingday")?;
    let casual_idx = column_index(&headers, "casual")?;
    let registered_idx = column_index(&headers, "registered")?;
    let count_idx = column_index(&headers, "count")?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|source| LoadError::Csv {
            row: row_no,
            source,
        })?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        records.push(Record {
            timestamp: parse_timestamp(cell(ts_idx), row_no)?,
            season: parse_cell(cell(season_idx), row_no, "season")?,
            weather: parse_cell(cell(weather_idx), row_no, "weather")?,
            temp: parse_cell(cell(temp_idx), row_no, "temp")?,
            workingday: parse_cell(cell(workingday_idx), row_no, "workingday")?,
            casual: parse_cell(cell(casual_idx), row_no, "casual")?,
            registered: parse_cell(cell(registered_idx), row_no, "registered")?,
            count: parse_cell(cell(count_idx), row_no, "count")?,
        });
    }

    Ok(records)
}

fn column_index(headers: &[String], column: &str) -> Result<usize, SchemaError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| SchemaError {
            column: column.to_string(),
        })
}

fn parse_cell<T: std::str::FromStr>(
    value: &str,
    row: usize,
    column: &str,
) -> Result<T, LoadError> {
    value.trim().parse::<T>().map_err(|_| LoadError::Value {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')` shape:
///
/// ```json
/// [
///   { "datetime": "2011-01-01 05:00:00", "season": 1, "weather": 2,
///     "temp": 9.84, "workingday": 0, "casual": 3, "registered": 13,
///     "count": 16 },
///   ...
/// ]
/// ```
fn load_json(path: &Path, timestamp_column: &str) -> Result<Vec<Record>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;

    let rows = root.as_array().ok_or_else(|| LoadError::Malformed {
        row: 0,
        message: "expected a top-level JSON array".to_string(),
    })?;

    let mut records = Vec::with_capacity(rows.len());
    for (row_no, value) in rows.iter().enumerate() {
        let obj = value.as_object().ok_or_else(|| LoadError::Malformed {
            row: row_no,
            message: "row is not a JSON object".to_string(),
        })?;

        let ts_value = require_field(obj, timestamp_column)?;
        let ts_str = ts_value.as_str().ok_or_else(|| LoadError::Timestamp {
            row: row_no,
            value: ts_value.to_string(),
        })?;

        records.push(Record {
            timestamp: parse_timestamp(ts_str, row_no)?,
            season: json_int(obj, "season", row_no)?,
            weather: json_int(obj, "weather", row_no)?,
            temp: json_f64(obj, "temp", row_no)?,
            workingday: json_int(obj, "workingday", row_no)?,
            casual: json_int(obj, "casual", row_no)?,
            registered: json_int(obj, "registered", row_no)?,
            count: json_int(obj, "count", row_no)?,
        });
    }

    Ok(records)
}

fn require_field<'a>(
    obj: &'a JsonMap<String, JsonValue>,
    column: &str,
) -> Result<&'a JsonValue, SchemaError> {
    obj.get(column).ok_or_else(|| SchemaError {
        column: column.to_string(),
    })
}

fn json_f64(obj: &JsonMap<String, JsonValue>, column: &str, row: usize) -> Result<f64, LoadError> {
    let value = require_field(obj, column)?;
    value.as_f64().ok_or_else(|| LoadError::Value {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn json_int<T: TryFrom<u64>>(
    obj: &JsonMap<String, JsonValue>,
    column: &str,
    row: usize,
) -> Result<T, LoadError> {
    let value = require_field(obj, column)?;
    value
        .as_u64()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| LoadError::Value {
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// The timestamp column may be any Arrow timestamp unit or a plain string
/// column; numeric columns may be any common integer or float width.
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, timestamp_column: &str) -> Result<Vec<Record>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut records = Vec::new();
    let mut row_base = 0usize;

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();

        let column = |name: &str| -> Result<usize, SchemaError> {
            schema.index_of(name).map_err(|_| SchemaError {
                column: name.to_string(),
            })
        };

        let ts_col = batch.column(column(timestamp_column)?);
        let season_col = batch.column(column("season")?);
        let weather_col = batch.column(column("weather")?);
        let temp_col = batch.column(column("temp")?);
        let workingday_col = batch.column(column("workingday")?);
        let casual_col = batch.column(column("casual")?);
        let registered_col = batch.column(column("registered")?);
        let count_col = batch.column(column("count")?);

        for row in 0..batch.num_rows() {
            let row_no = row_base + row;
            records.push(Record {
                timestamp: extract_timestamp(ts_col, row, row_no)?,
                season: extract_int(season_col, row, row_no, "season")?,
                weather: extract_int(weather_col, row, row_no, "weather")?,
                temp: extract_f64(temp_col, row, row_no, "temp")?,
                workingday: extract_int(workingday_col, row, row_no, "workingday")?,
                casual: extract_int(casual_col, row, row_no, "casual")?,
                registered: extract_int(registered_col, row, row_no, "registered")?,
                count: extract_int(count_col, row, row_no, "count")?,
            });
        }
        row_base += batch.num_rows();
    }

    Ok(records)
}

// -- Parquet / Arrow helpers --

/// Read a timestamp cell from any Arrow timestamp unit, or parse it from a
/// string column. The stored value is naive local time, so the epoch
/// offset converts straight back to the wall-clock reading.
fn extract_timestamp(col: &ArrayRef, row: usize, row_no: usize) -> Result<NaiveDateTime, LoadError> {
    if col.is_null(row) {
        return Err(LoadError::Timestamp {
            row: row_no,
            value: "null".to_string(),
        });
    }

    let invalid = |value: String| LoadError::Timestamp { row: row_no, value };

    match col.data_type() {
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let arr = downcast::<TimestampNanosecondArray>(col, row_no)?;
            Ok(DateTime::from_timestamp_nanos(arr.value(row)).naive_utc())
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let arr = downcast::<TimestampMicrosecondArray>(col, row_no)?;
            let micros = arr.value(row);
            DateTime::from_timestamp_micros(micros)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| invalid(micros.to_string()))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let arr = downcast::<TimestampMillisecondArray>(col, row_no)?;
            let millis = arr.value(row);
            DateTime::from_timestamp_millis(millis)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| invalid(millis.to_string()))
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            let arr = downcast::<TimestampSecondArray>(col, row_no)?;
            let secs = arr.value(row);
            DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| invalid(secs.to_string()))
        }
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(col, row_no)?;
            parse_timestamp(arr.value(row), row_no)
        }
        other => Err(invalid(format!("{other:?}"))),
    }
}

/// Read a numeric cell as `f64` from any common float or integer width.
fn extract_f64(col: &ArrayRef, row: usize, row_no: usize, column: &str) -> Result<f64, LoadError> {
    let bad_value = |value: String| LoadError::Value {
        row: row_no,
        column: column.to_string(),
        value,
    };
    if col.is_null(row) {
        return Err(bad_value("null".to_string()));
    }

    match col.data_type() {
        DataType::Float64 => Ok(downcast::<Float64Array>(col, row_no)?.value(row)),
        DataType::Float32 => Ok(f64::from(downcast::<Float32Array>(col, row_no)?.value(row))),
        DataType::Int64 => Ok(downcast::<Int64Array>(col, row_no)?.value(row) as f64),
        DataType::Int32 => Ok(f64::from(downcast::<Int32Array>(col, row_no)?.value(row))),
        other => Err(bad_value(format!("{other:?}"))),
    }
}

/// Read an integer cell, checked against the target width.
fn extract_int<T: TryFrom<i64>>(
    col: &ArrayRef,
    row: usize,
    row_no: usize,
    column: &str,
) -> Result<T, LoadError> {
    let bad_value = |value: String| LoadError::Value {
        row: row_no,
        column: column.to_string(),
        value,
    };
    if col.is_null(row) {
        return Err(bad_value("null".to_string()));
    }

    let wide = match col.data_type() {
        DataType::Int64 => downcast::<Int64Array>(col, row_no)?.value(row),
        DataType::Int32 => i64::from(downcast::<Int32Array>(col, row_no)?.value(row)),
        DataType::Int16 => i64::from(downcast::<Int16Array>(col, row_no)?.value(row)),
        other => return Err(bad_value(format!("{other:?}"))),
    };
    T::try_from(wide).map_err(|_| bad_value(wide.to_string()))
}

fn downcast<'a, T: Array + 'static>(col: &'a ArrayRef, row_no: usize) -> Result<&'a T, LoadError> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| LoadError::Malformed {
            row: row_no,
            message: format!("unexpected array layout for {:?}", col.data_type()),
        })
}

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Memoizes the loaded, feature-derived table by source path.
///
/// The table is immutable once built; re-requesting the same path hands out
/// the same `Arc` without touching the filesystem. Requesting a different
/// path drops the old entry and loads the new source.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(PathBuf, Arc<RentalTable>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        DatasetCache::default()
    }

    /// Return the cached table for `path`, loading and deriving it on the
    /// first request or when the source path changes.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<RentalTable>, LoadError> {
        if let Some((cached_path, table)) = &self.entry {
            if cached_path == path {
                return Ok(Arc::clone(table));
            }
        }

        let records = load_file(path)?;
        let table = Arc::new(RentalTable::new(derive_features(records)));
        info!(
            "loaded {} rows from {}",
            table.len(),
            path.display()
        );
        self.entry = Some((path.to_path_buf(), Arc::clone(&table)));
        Ok(table)
    }
}
