//! PriceTape CLI: export a daily closing price series to CSV.
//!
//! With no arguments it writes split/dividend-adjusted AAPL closes from
//! 2015-01-01 through today to `apple_daily_stock_2015_present.csv`.
//! Logs go to stderr (`RUST_LOG`, default `info`); the result and preview go
//! to stdout.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use pricetape_core::data::{CsvImportProvider, DataProvider, PriceAdjustment, YahooProvider};
use pricetape_core::export::{ExportOutcome, ExportRequest, PriceRecord, PriceSeriesExporter};
use pricetape_core::{DEFAULT_OUTPUT, DEFAULT_START, DEFAULT_SYMBOL};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricetape",
    about = "PriceTape: export a daily closing price series to CSV"
)]
struct Cli {
    /// Ticker symbol understood by the data provider.
    #[arg(long, default_value = DEFAULT_SYMBOL)]
    symbol: String,

    /// Start date (YYYY-MM-DD).
    #[arg(long, default_value = DEFAULT_START)]
    start: String,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,

    /// Output CSV file, replaced if it exists.
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Export prices as traded instead of split/dividend adjusted.
    #[arg(long, default_value_t = false)]
    unadjusted: bool,

    /// Read bars from a previously downloaded CSV file instead of Yahoo Finance.
    #[arg(long)]
    from_csv: Option<PathBuf>,

    /// Rows shown at each end of the console preview.
    #[arg(long, default_value_t = 5)]
    preview_rows: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let today = chrono::Local::now().date_naive();
    let request = build_request(&cli, today)?;

    let provider: Box<dyn DataProvider> = match &cli.from_csv {
        Some(path) => Box::new(CsvImportProvider::new(path)),
        None => Box::new(YahooProvider::new()?),
    };
    info!(
        symbol = %request.symbol,
        start = %request.start,
        end = %request.end,
        adjustment = ?request.adjustment,
        output = %request.output_path.display(),
        provider = provider.name(),
        "starting export"
    );

    let outcome = PriceSeriesExporter::new(provider.as_ref())
        .export(&request)
        .with_context(|| format!("export of {} failed", request.symbol))?;

    match outcome {
        ExportOutcome::Written { path, series } => {
            info!(path = %path.display(), rows = series.len(), "export finished");
            println!("Successfully created {}", path.display());
            print_preview("head", series.head(cli.preview_rows), 0);
            let tail = series.tail(cli.preview_rows);
            print_preview("tail", tail, series.len() - tail.len());
        }
        ExportOutcome::NoData => {
            warn!(symbol = %request.symbol, "provider returned no rows, output left untouched");
            println!("No data found.");
        }
    }

    Ok(())
}

/// Turn the parsed arguments into an export request; `today` caps the range.
fn build_request(cli: &Cli, today: NaiveDate) -> Result<ExportRequest> {
    let start = parse_date(&cli.start).context("invalid --start")?;
    let mut request = ExportRequest::new(cli.symbol.clone(), start, today, cli.output.clone());
    if let Some(end) = cli.end.as_deref() {
        request = request.with_end(parse_date(end).context("invalid --end")?);
    }
    if cli.unadjusted {
        request = request.with_adjustment(PriceAdjustment::Unadjusted);
    }
    Ok(request)
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("expected YYYY-MM-DD, got '{text}'"))
}

fn print_preview(label: &str, records: &[PriceRecord], first_index: usize) {
    println!();
    println!("--- {label} ---");
    println!("{:>6} {:<12} {:>12}", "", "date", "price (USD)");
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>6} {:<12} {:>12}",
            first_index + i,
            record.formatted_date(),
            record.formatted_price()
        );
    }
}
