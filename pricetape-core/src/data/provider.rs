//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV import)
//! so the exporter can be driven by a live source, an offline file, or a mock in tests.

use chrono::NaiveDate;
use polars::prelude::{DataFrame, PolarsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw daily OHLCV bar from a data provider (before adjustment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adj_close: f64,
}

impl RawBar {
    /// Apply the split/dividend adjustment: open/high/low are scaled by
    /// `adj_close / close` and close becomes the adjusted close.
    ///
    /// Bars with a zero or non-finite close cannot be scaled and are returned as-is.
    pub fn adjusted(&self) -> RawBar {
        if !self.close.is_finite() || self.close == 0.0 || !self.adj_close.is_finite() {
            return self.clone();
        }
        let ratio = self.adj_close / self.close;
        RawBar {
            date: self.date,
            open: self.open * ratio,
            high: self.high * ratio,
            low: self.low * ratio,
            close: self.adj_close,
            volume: self.volume,
            adj_close: self.adj_close,
        }
    }
}

/// How prices should be adjusted for corporate actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceAdjustment {
    /// Retroactively adjusted for splits and dividends (adjusted-close convention).
    #[default]
    SplitAndDividend,
    /// Prices as traded.
    Unadjusted,
}

impl PriceAdjustment {
    pub fn apply(self, bar: &RawBar) -> RawBar {
        match self {
            PriceAdjustment::SplitAndDividend => bar.adjusted(),
            PriceAdjustment::Unadjusted => bar.clone(),
        }
    }
}

/// Structured error types for data operations.
///
/// These are designed to be displayable directly in the CLI.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("HTTP {status} from provider for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("import failed: {0}")]
    Import(String),

    #[error("failed to build price table: {0}")]
    Table(#[from] PolarsError),
}

/// A single request for daily bars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub adjustment: PriceAdjustment,
}

/// Result of a successful data fetch for a single symbol.
///
/// `table` holds one row per trading day with the date in column 0 and the
/// value columns after it. Header names depend on the source.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub table: DataFrame,
    pub source: DataSource,
}

impl FetchResult {
    pub fn is_empty(&self) -> bool {
        self.table.height() == 0
    }
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
}

/// Trait for data providers (Yahoo Finance, CSV import, etc).
///
/// Implementations handle the specifics of fetching data from a particular source.
/// An empty table is a valid answer; only transport and format problems are errors.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for a symbol over a date range.
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, DataError>;
}
