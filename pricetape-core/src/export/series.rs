//! Price records and the ordered series written to disk.

use super::schema::{PriceSchema, SchemaError, DATE_COLUMN, DATE_FORMAT, PRICE_COLUMN};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Round half away from zero to two decimals.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

/// One trading day: date and closing price (two decimals).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub price: f64,
}

impl PriceRecord {
    /// Build a record, rounding the price. Negative and non-finite prices are rejected.
    pub fn new(date: NaiveDate, price: f64) -> Result<Self, SchemaError> {
        if !price.is_finite() || price < 0.0 {
            return Err(SchemaError::InvalidPrice {
                date,
                value: price.to_string(),
            });
        }
        Ok(Self {
            date,
            price: round_price(price),
        })
    }

    pub fn formatted_date(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn formatted_price(&self) -> String {
        format!("{:.2}", self.price)
    }
}

/// Date-ordered closing prices for a single symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    records: Vec<PriceRecord>,
}

impl PriceSeries {
    /// Sort records ascending by date. A date seen more than once keeps its
    /// last record, so dates are strictly increasing.
    pub fn new(mut records: Vec<PriceRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        records.dedup_by(|later, kept| {
            if later.date == kept.date {
                *kept = *later;
                true
            } else {
                false
            }
        });
        Self { records }
    }

    /// Read a projected `date` / `price (USD)` table.
    pub fn from_frame(df: &DataFrame) -> Result<Self, SchemaError> {
        PriceSchema::validate(df)?;
        let dates = column_dates(df.column(DATE_COLUMN)?)?;
        let prices = column_prices(df.column(PRICE_COLUMN)?)?;

        let records = dates
            .into_iter()
            .zip(prices)
            .map(|(date, price)| match price {
                Some(p) => PriceRecord::new(date, p),
                None => Err(SchemaError::NullPrice { date }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&PriceRecord> {
        self.records.first()
    }

    pub fn last(&self) -> Option<&PriceRecord> {
        self.records.last()
    }

    /// First `n` records.
    pub fn head(&self, n: usize) -> &[PriceRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// Last `n` records.
    pub fn tail(&self, n: usize) -> &[PriceRecord] {
        &self.records[self.records.len().saturating_sub(n)..]
    }
}

fn column_dates(column: &Column) -> Result<Vec<NaiveDate>, SchemaError> {
    let series = column.as_materialized_series();
    let dtype = series.dtype().clone();
    match dtype {
        DataType::Date => {
            let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
            let days = series.cast(&DataType::Int32)?;
            days.i32()?
                .into_iter()
                .enumerate()
                .map(|(row, d)| {
                    d.map(|d| epoch + chrono::Duration::days(d as i64))
                        .ok_or(SchemaError::NullDate { row })
                })
                .collect()
        }
        DataType::Datetime(unit, tz) => {
            let offset =
                zone_offset(tz.as_deref()).ok_or_else(|| SchemaError::UnsupportedTimeZone {
                    column: column.name().to_string(),
                    tz: tz.as_deref().unwrap_or_default().to_string(),
                })?;
            let ticks = series.cast(&DataType::Int64)?;
            ticks
                .i64()?
                .into_iter()
                .enumerate()
                .map(|(row, t)| {
                    let t = t.ok_or(SchemaError::NullDate { row })?;
                    let dt = match unit {
                        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(t)),
                        TimeUnit::Microseconds => DateTime::from_timestamp_micros(t),
                        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(t),
                    };
                    dt.map(|dt| dt.with_timezone(&offset).date_naive())
                        .ok_or(SchemaError::InvalidDate {
                            row,
                            value: t.to_string(),
                        })
                })
                .collect()
        }
        DataType::String => series
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, s)| {
                let s = s.ok_or(SchemaError::NullDate { row })?;
                parse_date_text(s).ok_or_else(|| SchemaError::InvalidDate {
                    row,
                    value: s.to_string(),
                })
            })
            .collect(),
        other => Err(SchemaError::UnsupportedType {
            column: column.name().to_string(),
            dtype: other,
        }),
    }
}

/// Offset of a datetime column's zone. Naive columns are read as UTC; named
/// zones other than UTC are not resolved.
fn zone_offset(tz: Option<&str>) -> Option<FixedOffset> {
    let utc = FixedOffset::east_opt(0);
    match tz.map(str::trim) {
        None | Some("") | Some("UTC") | Some("Etc/UTC") | Some("Z") => utc,
        Some(other) => other.parse::<FixedOffset>().ok(),
    }
}

/// `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text.get(..10)?, DATE_FORMAT).ok()
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}

fn column_prices(column: &Column) -> Result<Vec<Option<f64>>, SchemaError> {
    let series = column.as_materialized_series();
    if !is_numeric(series.dtype()) {
        return Err(SchemaError::UnsupportedType {
            column: column.name().to_string(),
            dtype: series.dtype().clone(),
        });
    }
    let prices = series.cast(&DataType::Float64)?;
    let values = prices.f64()?.into_iter().collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::date_series;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn prices_round_to_two_decimals() {
        assert_eq!(round_price(27.332), 27.33);
        assert_eq!(round_price(26.568), 26.57);
        assert_eq!(round_price(0.125), 0.13);
        assert_eq!(PriceRecord::new(d(2015, 1, 2), 27.332).unwrap().formatted_price(), "27.33");
    }

    #[test]
    fn whole_prices_keep_two_digits() {
        let r = PriceRecord::new(d(2015, 1, 2), 100.0).unwrap();
        assert_eq!(r.formatted_price(), "100.00");
        assert_eq!(r.formatted_date(), "2015-01-02");
    }

    #[test]
    fn negative_and_nan_prices_are_rejected() {
        assert!(PriceRecord::new(d(2015, 1, 2), -1.0).is_err());
        assert!(PriceRecord::new(d(2015, 1, 2), f64::NAN).is_err());
    }

    #[test]
    fn from_frame_reads_date_typed_column() {
        let dates = date_series(DATE_COLUMN, &[d(2015, 1, 2), d(2015, 1, 5)]).unwrap();
        let df = DataFrame::new(vec![
            Column::Series(dates.into()),
            Column::Series(Series::new(PRICE_COLUMN.into(), &[27.332, 26.568]).into()),
        ])
        .unwrap();
        let series = PriceSeries::from_frame(&df).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.records()[0], PriceRecord { date: d(2015, 1, 2), price: 27.33 });
        assert_eq!(series.records()[1], PriceRecord { date: d(2015, 1, 5), price: 26.57 });
    }

    #[test]
    fn from_frame_reads_datetime_column() {
        // 2015-01-02T00:00:00Z in milliseconds
        let ts = Series::new(DATE_COLUMN.into(), &[1420156800000i64])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let df = DataFrame::new(vec![
            Column::Series(ts.into()),
            Column::Series(Series::new(PRICE_COLUMN.into(), &[27.33]).into()),
        ])
        .unwrap();
        let series = PriceSeries::from_frame(&df).unwrap();
        assert_eq!(series.records()[0].date, d(2015, 1, 2));
    }

    #[test]
    fn datetime_zone_decides_the_trading_date() {
        // 2015-01-01T15:00:00Z is already 2015-01-02 in Tokyo
        let utc = DateTime::from_timestamp(1420124400, 0).unwrap();
        let tokyo = zone_offset(Some("+09:00")).unwrap();
        assert_eq!(utc.with_timezone(&tokyo).date_naive(), d(2015, 1, 2));
        assert_eq!(zone_offset(None), FixedOffset::east_opt(0));
        assert_eq!(zone_offset(Some("UTC")), FixedOffset::east_opt(0));
        assert_eq!(zone_offset(Some("-05:00")), FixedOffset::west_opt(5 * 3600));
        assert_eq!(zone_offset(Some("America/New_York")), None);
    }

    #[test]
    fn from_frame_reads_utc_datetime_column() {
        let ts = Series::new(DATE_COLUMN.into(), &[1420156800000i64])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, Some("UTC".into())))
            .unwrap();
        let df = DataFrame::new(vec![
            Column::Series(ts.into()),
            Column::Series(Series::new(PRICE_COLUMN.into(), &[27.33]).into()),
        ])
        .unwrap();
        let series = PriceSeries::from_frame(&df).unwrap();
        assert_eq!(series.records()[0].date, d(2015, 1, 2));
    }

    #[test]
    fn duplicate_dates_keep_the_last_record() {
        let df = df!(
            DATE_COLUMN => &["2015-01-02", "2015-01-05", "2015-01-02"],
            PRICE_COLUMN => &[27.33, 26.57, 27.40],
        )
        .unwrap();
        let series = PriceSeries::from_frame(&df).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.records()[0], PriceRecord { date: d(2015, 1, 2), price: 27.40 });
        for pair in series.records().windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn from_frame_reads_text_dates_and_integer_prices() {
        let df = df!(
            DATE_COLUMN => &["2015-01-05 00:00:00", "2015-01-02"],
            PRICE_COLUMN => &[26i64, 27],
        )
        .unwrap();
        let series = PriceSeries::from_frame(&df).unwrap();
        // sorted ascending
        assert_eq!(series.records()[0].date, d(2015, 1, 2));
        assert_eq!(series.records()[1].formatted_price(), "26.00");
    }

    #[test]
    fn null_price_is_reported_with_its_date() {
        let df = df!(
            DATE_COLUMN => &["2015-01-02"],
            PRICE_COLUMN => &[None::<f64>],
        )
        .unwrap();
        assert!(matches!(
            PriceSeries::from_frame(&df),
            Err(SchemaError::NullPrice { date }) if date == d(2015, 1, 2)
        ));
    }

    #[test]
    fn text_price_column_is_unsupported() {
        let df = df!(
            DATE_COLUMN => &["2015-01-02"],
            PRICE_COLUMN => &["27.33"],
        )
        .unwrap();
        assert!(matches!(
            PriceSeries::from_frame(&df),
            Err(SchemaError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn head_and_tail_clamp_to_length() {
        let series = PriceSeries::new(vec![
            PriceRecord::new(d(2015, 1, 2), 1.0).unwrap(),
            PriceRecord::new(d(2015, 1, 5), 2.0).unwrap(),
            PriceRecord::new(d(2015, 1, 6), 3.0).unwrap(),
        ]);
        assert_eq!(series.head(2).len(), 2);
        assert_eq!(series.head(10).len(), 3);
        assert_eq!(series.tail(1)[0].price, 3.0);
        assert_eq!(series.tail(10).len(), 3);
    }
}
