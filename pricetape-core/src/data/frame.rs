//! Raw price tables built from provider bars.
//!
//! Layout: `Date, Open, High, Low, Close, Volume`. The composite layout keeps the
//! same order but carries two header levels (field, ticker) joined by
//! [`HEADER_LEVEL_SEPARATOR`], the way multi-ticker downloads are shaped.

use super::provider::{DataError, RawBar};
use chrono::NaiveDate;
use polars::prelude::*;

/// Separator between the levels of a composite column header.
pub const HEADER_LEVEL_SEPARATOR: &str = "|";

/// Shape of the column headers of a raw table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HeaderLayout {
    /// Plain names: `Date`, `Close`, ...
    #[default]
    Flat,
    /// Two-level names: `Price|Ticker|Date`, `Close|AAPL`, ...
    Composite { ticker: String },
}

impl HeaderLayout {
    fn date_header(&self) -> String {
        match self {
            HeaderLayout::Flat => "Date".to_string(),
            HeaderLayout::Composite { .. } => join_levels(&["Price", "Ticker", "Date"]),
        }
    }

    fn value_header(&self, field: &str) -> String {
        match self {
            HeaderLayout::Flat => field.to_string(),
            HeaderLayout::Composite { ticker } => join_levels(&[field, ticker]),
        }
    }
}

/// Join header levels into a single column name, skipping empty levels.
pub fn join_levels<S: AsRef<str>>(levels: &[S]) -> String {
    levels
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(HEADER_LEVEL_SEPARATOR)
}

/// Split a column name into its header levels.
pub fn split_levels(name: &str) -> impl Iterator<Item = &str> {
    name.split(HEADER_LEVEL_SEPARATOR).map(str::trim)
}

/// Days since the Unix epoch, the physical representation of a polars `Date`.
pub fn epoch_days(date: NaiveDate) -> i32 {
    (date - chrono::DateTime::<chrono::Utc>::UNIX_EPOCH.date_naive()).num_days() as i32
}

/// Build a `Date`-typed series from calendar dates.
pub fn date_series(name: &str, dates: &[NaiveDate]) -> Result<Series, DataError> {
    let days: Vec<i32> = dates.iter().map(|d| epoch_days(*d)).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

/// Convert bars into a raw table with the given header layout.
pub fn bars_to_frame(bars: &[RawBar], layout: &HeaderLayout) -> Result<DataFrame, DataError> {
    let dates: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    let df = DataFrame::new(vec![
        Column::Series(date_series(&layout.date_header(), &dates)?.into()),
        Column::Series(Series::new(layout.value_header("Open").into(), opens).into()),
        Column::Series(Series::new(layout.value_header("High").into(), highs).into()),
        Column::Series(Series::new(layout.value_header("Low").into(), lows).into()),
        Column::Series(Series::new(layout.value_header("Close").into(), closes).into()),
        Column::Series(Series::new(layout.value_header("Volume").into(), volumes).into()),
    ])?;
    Ok(df)
}
