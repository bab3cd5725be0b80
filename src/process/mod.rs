use crate::table::Table;
use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Parses a local file into a [`Table`].
///
/// Parse errors pass through to the caller unchanged.
pub trait TableReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Table>;
}

/// CSV reader that infers one Arrow type per column.
///
/// Expects a header row. Cells are trimmed before inference; empty cells and
/// fields missing from short records become nulls. A column is `Int64` when
/// every present cell parses as an integer, `Float64` when every present cell
/// parses as a float, and `Utf8` otherwise.
pub struct CsvTableReader {
    delimiter: u8,
}

impl CsvTableReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TableReader for CsvTableReader {
    #[tracing::instrument(level = "debug", skip(self, path), fields(path = %path.display()))]
    fn read(&self, path: &Path) -> Result<Table> {
        let file =
            File::open(path).with_context(|| format!("failed to open CSV file {:?}", path))?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers: Vec<String> = rdr
            .headers()
            .with_context(|| format!("failed to read CSV header from {:?}", path))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() {
            debug!("no header row; treating file as empty");
            return Ok(Table::empty());
        }

        // Accumulate rows as cleaned optional cells; None marks a missing value.
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            let record = result
                .with_context(|| format!("CSV parse error in {:?} at record {}", path, idx))?;
            let row: Vec<Option<String>> = (0..headers.len())
                .map(|col| {
                    record.get(col).and_then(|raw| {
                        let cell = raw.trim();
                        if cell.is_empty() {
                            None
                        } else {
                            Some(cell.to_string())
                        }
                    })
                })
                .collect();
            rows.push(row);
        }

        let batch = build_batch(&headers, &rows)?;
        debug!(
            rows = batch.num_rows(),
            columns = batch.num_columns(),
            "parsed CSV"
        );
        Ok(Table::new(batch))
    }
}

/// Infer the Arrow type of one column over its present cells.
fn infer_column_type(rows: &[Vec<Option<String>>], col: usize) -> DataType {
    let mut saw_value = false;
    let mut all_ints = true;
    let mut all_floats = true;

    for cell in rows.iter().filter_map(|row| row[col].as_deref()) {
        saw_value = true;
        if all_ints && cell.parse::<i64>().is_err() {
            all_ints = false;
        }
        if all_floats && cell.parse::<f64>().is_err() {
            all_floats = false;
        }
        if !all_ints && !all_floats {
            return DataType::Utf8;
        }
    }

    if !saw_value {
        DataType::Utf8
    } else if all_ints {
        DataType::Int64
    } else if all_floats {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

fn build_batch(headers: &[String], rows: &[Vec<Option<String>>]) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(headers.len());

    for (col, name) in headers.iter().enumerate() {
        let array: ArrayRef = match infer_column_type(rows, col) {
            DataType::Int64 => {
                let mut b = Int64Builder::new();
                for row in rows {
                    b.append_option(row[col].as_deref().and_then(|s| s.parse().ok()));
                }
                Arc::new(b.finish())
            }
            DataType::Float64 => {
                let mut b = Float64Builder::new();
                for row in rows {
                    b.append_option(row[col].as_deref().and_then(|s| s.parse().ok()));
                }
                Arc::new(b.finish())
            }
            _ => {
                let mut b = StringBuilder::new();
                for row in rows {
                    b.append_option(row[col].as_deref());
                }
                Arc::new(b.finish())
            }
        };
        fields.push(Field::new(name.as_str(), array.data_type().clone(), true));
        columns.push(array);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(Into::into)
}
