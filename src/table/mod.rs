use anyhow::Result;
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

/// In-memory table: named, typed columns over a single Arrow record batch.
///
/// Equality is structural (schema plus cell values).
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// A table with zero rows and zero columns.
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(Arc::new(Schema::empty())),
        }
    }

    /// Concatenate reader output into a single table.
    pub fn from_batches(schema: SchemaRef, batches: &[RecordBatch]) -> Result<Self> {
        let batch = concat_batches(&schema, batches)?;
        Ok(Self { batch })
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    /// A table is empty when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0 || self.num_columns() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .collect()
    }

    /// Null count for the column at `idx`.
    pub fn null_count(&self, idx: usize) -> usize {
        self.batch.column(idx).null_count()
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }
}
