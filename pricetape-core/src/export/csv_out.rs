//! CSV serialization of a price series.
//!
//! Format: UTF-8, comma-delimited, `\n` line endings, header `date,price (USD)`,
//! no index column. Rendering is idempotent: parsing the output and rendering
//! it again yields the same bytes.

use super::exporter::ExportError;
use super::schema::{PriceSchema, SchemaError, DATE_FORMAT};
use super::series::{PriceRecord, PriceSeries};
use chrono::NaiveDate;
use std::path::Path;

/// Render the series as CSV text.
pub fn render_csv(series: &PriceSeries) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(PriceSchema::header())?;

    for record in series.records() {
        wtr.write_record([record.formatted_date(), record.formatted_price()])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // every field was written from a String
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Parse CSV text produced by [`render_csv`] back into a series.
pub fn parse_csv(text: &str) -> Result<PriceSeries, ExportError> {
    let mut rdr = csv::Reader::from_reader(text.as_bytes());

    let headers = rdr.headers()?.clone();
    if headers.iter().ne(PriceSchema::header()) {
        return Err(SchemaError::UnexpectedHeader(headers.iter().collect::<Vec<_>>().join(",")).into());
    }

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let date_text = record.get(0).unwrap_or("");
        let price_text = record.get(1).unwrap_or("");

        let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT).map_err(|_| {
            SchemaError::InvalidDate {
                row,
                value: date_text.to_string(),
            }
        })?;
        let price: f64 = price_text.parse().map_err(|_| SchemaError::InvalidPrice {
            date,
            value: price_text.to_string(),
        })?;
        records.push(PriceRecord::new(date, price)?);
    }

    Ok(PriceSeries::new(records))
}

/// Write the series to `path`, replacing any existing file. Returns the record count.
pub fn write_csv(series: &PriceSeries, path: &Path) -> Result<usize, ExportError> {
    let text = render_csv(series)?;
    std::fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(series.len())
}
