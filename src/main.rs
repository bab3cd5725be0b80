use anyhow::Result;
use csvfetch::{CsvTableReader, DataPreprocessor, HttpFetcher};
use std::{env, path::PathBuf, process::exit};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <LOCATOR> [DATA_DIR]", args[0]);
        exit(1);
    }
    let locator = &args[1];
    let data_dir = args
        .get(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let pre = DataPreprocessor::new(
        locator.as_str(),
        &data_dir,
        HttpFetcher::new(),
        CsvTableReader::new(),
    );
    info!(locator = %locator, dest = %pre.output_file().display(), "loading");

    let table = pre.load().await?;
    pre.inspect(&table)?;

    let (rows, columns) = table.shape();
    println!("=== {} ===", pre.output_file().display());
    println!("Rows:    {}", rows);
    println!("Columns: {}", columns);
    println!();
    println!("=== Columns ===");
    let schema = table.schema();
    for (idx, field) in schema.fields().iter().enumerate() {
        println!(
            "- {:<30} | Type: {:<10} | Nulls: {}",
            field.name(),
            field.data_type().to_string(),
            table.null_count(idx)
        );
    }

    Ok(())
}
