//! CSV import provider, an offline source for previously exported price tables.
//!
//! Accepts a single header row (`Date,Open,High,Low,Close,Volume`) or the
//! multi-row header written by multi-level downloads:
//!
//! ```text
//! Price,Close,High,Low,Open,Volume
//! Ticker,AAPL,AAPL,AAPL,AAPL,AAPL
//! Date,,,,,
//! 2015-01-02,24.26,24.72,23.81,24.71,212818400
//! ```
//!
//! Header rows are every row before the first one whose leading cell parses
//! as a date. Multi-row headers are joined into composite column names.

use super::frame::{date_series, join_levels};
use super::provider::{DataError, DataProvider, DataSource, FetchRequest, FetchResult};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Provider that reads a local CSV file instead of the network.
pub struct CsvImportProvider {
    path: PathBuf,
}

impl CsvImportProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse CSV text into a raw table, keeping rows within `[start, end]`.
    pub fn parse(content: &str, start: NaiveDate, end: NaiveDate) -> Result<DataFrame, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut header_rows: Vec<Vec<String>> = Vec::new();
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = Vec::new();

        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| DataError::Import(format!("line {}: {e}", line + 1)))?;
            let first = record.get(0).unwrap_or("");

            let Some(date) = parse_date_cell(first) else {
                if dates.is_empty() {
                    header_rows.push(record.iter().map(str::to_string).collect());
                    continue;
                }
                return Err(DataError::Import(format!(
                    "line {}: invalid date '{first}'",
                    line + 1
                )));
            };

            if values.is_empty() {
                let width = header_rows.iter().map(Vec::len).max().unwrap_or(0);
                if width < 2 {
                    return Err(DataError::Import("missing header row".into()));
                }
                values = vec![Vec::new(); width - 1];
            }

            if date < start || date > end {
                continue;
            }

            dates.push(date);
            for (j, column) in values.iter_mut().enumerate() {
                let cell = record.get(j + 1).unwrap_or("").trim();
                let value = if cell.is_empty() {
                    None
                } else {
                    Some(cell.parse::<f64>().map_err(|e| {
                        DataError::Import(format!("line {}: '{cell}': {e}", line + 1))
                    })?)
                };
                column.push(value);
            }
        }

        if header_rows.is_empty() {
            return Err(DataError::Import("missing header row".into()));
        }
        let width = header_rows.iter().map(Vec::len).max().unwrap_or(0);
        if values.is_empty() {
            values = vec![Vec::new(); width.saturating_sub(1)];
        }

        let header = |j: usize| -> String {
            let levels: Vec<&str> = header_rows
                .iter()
                .map(|row| row.get(j).map(String::as_str).unwrap_or(""))
                .collect();
            join_levels(&levels)
        };

        debug!(
            header_rows = header_rows.len(),
            columns = width,
            rows = dates.len(),
            "parsed import header"
        );

        let mut columns = vec![Column::Series(date_series(&header(0), &dates)?.into())];
        for (j, column) in values.into_iter().enumerate() {
            columns.push(Column::Series(Series::new(header(j + 1).into(), column).into()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Parse a leading date cell: `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date_cell(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    let head = cell.get(..10)?;
    let rest = &cell[10..];
    if !rest.is_empty() && !rest.starts_with([' ', 'T']) {
        return None;
    }
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

impl DataProvider for CsvImportProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, DataError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DataError::Import(format!("{}: {e}", self.path.display())))?;
        let table = Self::parse(&content, request.start, request.end)?;
        info!(
            path = %self.path.display(),
            symbol = %request.symbol,
            rows = table.height(),
            "imported price table"
        );

        Ok(FetchResult {
            symbol: request.symbol.clone(),
            table,
            source: DataSource::CsvImport,
        })
    }
}
