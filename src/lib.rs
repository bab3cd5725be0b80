pub mod fetch;
pub mod preprocess;
pub mod process;
pub mod table;

pub use fetch::{Fetcher, HttpFetcher};
pub use preprocess::{DataPreprocessor, InspectError};
pub use process::{CsvTableReader, TableReader};
pub use table::Table;
