use crate::fetch::{urls, Fetcher};
use crate::process::TableReader;
use crate::table::Table;
use anyhow::Result;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info_span, warn, Instrument, Span};

/// Structural validation failure raised by [`DataPreprocessor::inspect`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InspectError {
    #[error("The DataFrame is empty.")]
    EmptyTable,
}

/// Downloads a remotely hosted CSV file and loads it into a [`Table`].
///
/// The fetch and parse steps are injected so callers can substitute test
/// doubles; the preprocessor itself only sequences them and carries the
/// logging context.
pub struct DataPreprocessor<F, R> {
    locator: String,
    download_url: String,
    output_file: PathBuf,
    fetcher: F,
    reader: R,
    span: Span,
}

impl<F: Fetcher, R: TableReader> DataPreprocessor<F, R> {
    /// The destination path is `data_dir` joined with a filename derived
    /// from the locator; repeated loads overwrite the same file. The locator
    /// itself is not validated here, only by the fetcher.
    pub fn new(
        locator: impl Into<String>,
        data_dir: impl AsRef<Path>,
        fetcher: F,
        reader: R,
    ) -> Self {
        let locator = locator.into();
        let download_url = urls::to_download_url(&locator);
        let output_file = data_dir.as_ref().join(urls::derive_filename(&locator));
        let span = info_span!("preprocess", locator = %locator);
        Self {
            locator,
            download_url,
            output_file,
            fetcher,
            reader,
            span,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    /// Local path the download lands at.
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Download the source file and parse it into a table.
    ///
    /// The fetcher runs exactly once per call, then the reader runs on the
    /// same destination path. Errors from either collaborator propagate
    /// unchanged, and the downloaded file stays on disk either way.
    pub async fn load(&self) -> Result<Table> {
        async {
            debug!(url = %self.download_url, dest = %self.output_file.display(), "downloading");
            self.fetcher
                .download(&self.download_url, &self.output_file)
                .await?;

            debug!(dest = %self.output_file.display(), "download complete; parsing");
            let table = self.reader.read(&self.output_file)?;

            let (rows, columns) = table.shape();
            debug!(rows, columns, "loaded table");
            Ok(table)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Validate that `table` is structurally sound and log a summary.
    ///
    /// Tables with zero rows or zero columns are rejected; anything else
    /// passes, missing values included.
    pub fn inspect(&self, table: &Table) -> Result<(), InspectError> {
        let _guard = self.span.enter();

        if table.is_empty() {
            warn!(
                rows = table.num_rows(),
                columns = table.num_columns(),
                "table failed inspection"
            );
            return Err(InspectError::EmptyTable);
        }

        let (rows, columns) = table.shape();
        debug!(rows, columns, "inspecting table");
        let schema = table.schema();
        for (idx, field) in schema.fields().iter().enumerate() {
            debug!(
                name = field.name().as_str(),
                dtype = %field.data_type(),
                nulls = table.null_count(idx),
                "column"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const DRIVE_LINK: &str = "https://drive.google.com/file/d/1abcdefg/view?usp=sharing";

    /// Fetcher double that records destinations instead of touching the network.
    struct MockFetcher {
        calls: AtomicUsize,
        dests: Mutex<Vec<PathBuf>>,
        fail: bool,
    }

    impl MockFetcher {
        fn succeeding() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                dests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::succeeding()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn download(&self, _locator: &str, dest: &Path) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.dests.lock().unwrap().push(dest.to_path_buf());
            if self.fail {
                return Err(anyhow!("download error"));
            }
            Ok(())
        }
    }

    /// Reader double returning a fixed 2x2 table.
    struct StubReader {
        calls: AtomicUsize,
        paths: Mutex<Vec<PathBuf>>,
    }

    impl StubReader {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                paths: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TableReader for StubReader {
        fn read(&self, path: &Path) -> Result<Table> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.paths.lock().unwrap().push(path.to_path_buf());
            Ok(two_by_two())
        }
    }

    fn two_by_two() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("A", DataType::Int64, true),
            Field::new("B", DataType::Int64, true),
        ]));
        let a = Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef;
        let b = Arc::new(Int64Array::from(vec![3, 4])) as ArrayRef;
        Table::new(RecordBatch::try_new(schema, vec![a, b]).unwrap())
    }

    fn three_by_three() -> Table {
        let schema = Arc::new(Schema::new(vec![
            Field::new("A", DataType::Int64, true),
            Field::new("B", DataType::Float64, true),
            Field::new("C", DataType::Utf8, true),
        ]));
        let a = Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef;
        let b = Arc::new(Float64Array::from(vec![Some(4.0), Some(5.5), None])) as ArrayRef;
        let c = Arc::new(StringArray::from(vec!["foo", "bar", "baz"])) as ArrayRef;
        Table::new(RecordBatch::try_new(schema, vec![a, b, c]).unwrap())
    }

    fn preprocessor(fetcher: MockFetcher) -> DataPreprocessor<MockFetcher, StubReader> {
        DataPreprocessor::new(DRIVE_LINK, "data", fetcher, StubReader::new())
    }

    #[tokio::test]
    async fn load_fetches_then_reads_the_same_path() {
        let pre = preprocessor(MockFetcher::succeeding());
        let table = pre.load().await.unwrap();

        assert_eq!(table.shape(), (2, 2));
        assert_eq!(pre.fetcher.calls(), 1);
        assert_eq!(pre.reader.calls(), 1);
        assert_eq!(pre.output_file(), Path::new("data/1abcdefg.csv"));

        let fetched = pre.fetcher.dests.lock().unwrap().clone();
        let read = pre.reader.paths.lock().unwrap().clone();
        assert_eq!(fetched, vec![pre.output_file().to_path_buf()]);
        assert_eq!(read, fetched);
    }

    #[tokio::test]
    async fn load_propagates_download_failure() {
        let pre = preprocessor(MockFetcher::failing());
        let err = pre.load().await.unwrap_err();

        assert_eq!(err.to_string(), "download error");
        assert_eq!(pre.fetcher.calls(), 1);
        assert_eq!(pre.reader.calls(), 0);
    }

    #[tokio::test]
    async fn load_twice_invokes_collaborators_twice() {
        let pre = preprocessor(MockFetcher::succeeding());
        let first = pre.load().await.unwrap();
        let second = pre.load().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(pre.fetcher.calls(), 2);
        assert_eq!(pre.reader.calls(), 2);
    }

    #[test]
    fn inspect_accepts_table_with_missing_values() {
        let pre = preprocessor(MockFetcher::succeeding());
        let table = three_by_three();

        assert_eq!(table.null_count(1), 1);
        assert!(pre.inspect(&table).is_ok());
    }

    #[test]
    fn inspect_rejects_fully_empty_table() {
        let pre = preprocessor(MockFetcher::succeeding());
        let err = pre.inspect(&Table::empty()).unwrap_err();

        assert_eq!(err, InspectError::EmptyTable);
        assert_eq!(err.to_string(), "The DataFrame is empty.");
    }

    #[test]
    fn inspect_rejects_zero_row_table() {
        let pre = preprocessor(MockFetcher::succeeding());
        let schema = Arc::new(Schema::new(vec![Field::new("A", DataType::Int64, true)]));
        let table = Table::new(RecordBatch::new_empty(schema));

        assert_eq!(pre.inspect(&table).unwrap_err(), InspectError::EmptyTable);
    }
}
