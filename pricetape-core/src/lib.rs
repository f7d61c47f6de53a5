//! PriceTape Core: daily closing price export.
//!
//! This crate contains the whole pipeline behind the `pricetape` binary:
//! - Data providers (Yahoo Finance chart API, CSV import) behind one trait
//! - Raw price tables with flat or composite column headers
//! - Column resolution with an explicit positional fallback
//! - Price series shaping (ISO dates, two-decimal prices)
//! - CSV serialization and the exporter that ties it together

pub mod data;
pub mod export;

pub use data::{DataError, DataProvider, PriceAdjustment};
pub use export::{ExportError, ExportOutcome, ExportRequest, PriceSeries, PriceSeriesExporter};

/// Symbol exported when none is given.
pub const DEFAULT_SYMBOL: &str = "AAPL";

/// First day requested when no start date is given.
pub const DEFAULT_START: &str = "2015-01-01";

/// Output file written when no path is given.
pub const DEFAULT_OUTPUT: &str = "apple_daily_stock_2015_present.csv";

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: providers and results can move across threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvImportProvider>();
        require_sync::<data::CsvImportProvider>();
        require_send::<PriceSeries>();
        require_sync::<PriceSeries>();
        require_send::<ExportOutcome>();
        require_sync::<ExportOutcome>();
    }

    #[test]
    fn default_start_is_an_iso_date() {
        assert!(chrono::NaiveDate::parse_from_str(DEFAULT_START, "%Y-%m-%d").is_ok());
    }
}
