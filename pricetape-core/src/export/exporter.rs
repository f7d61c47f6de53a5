//! PriceSeriesExporter: fetch a raw table, shape it and write the CSV.
//!
//! One linear pass per request: provider fetch → column resolution →
//! projection/rename → date formatting and price rounding → CSV file.
//! An empty provider response ends the pass early without touching the
//! output path.

use super::csv_out::write_csv;
use super::schema::SchemaError;
use super::select::{project, resolve_columns};
use super::series::PriceSeries;
use crate::data::provider::{DataError, DataProvider, FetchRequest, PriceAdjustment};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid export request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Provider(#[from] DataError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Parameters of a single export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub symbol: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Execution date; `start` may not lie after it.
    pub as_of: NaiveDate,
    pub adjustment: PriceAdjustment,
    pub output_path: PathBuf,
}

impl ExportRequest {
    /// Request everything from `start` through `today`, split/dividend adjusted.
    pub fn new(
        symbol: impl Into<String>,
        start: NaiveDate,
        today: NaiveDate,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            start,
            end: today,
            as_of: today,
            adjustment: PriceAdjustment::default(),
            output_path: output_path.into(),
        }
    }

    pub fn with_end(mut self, end: NaiveDate) -> Self {
        self.end = end;
        self
    }

    pub fn with_adjustment(mut self, adjustment: PriceAdjustment) -> Self {
        self.adjustment = adjustment;
        self
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.symbol.trim().is_empty() {
            return Err(ExportError::InvalidRequest("symbol is empty".into()));
        }
        if self.start > self.as_of {
            return Err(ExportError::InvalidRequest(format!(
                "start date {} is in the future (today is {})",
                self.start, self.as_of
            )));
        }
        if self.start > self.end {
            return Err(ExportError::InvalidRequest(format!(
                "start date {} is after end date {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    fn fetch_request(&self) -> FetchRequest {
        FetchRequest {
            symbol: self.symbol.trim().to_string(),
            start: self.start,
            end: self.end,
            adjustment: self.adjustment,
        }
    }
}

/// What an export run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    /// The file at `path` now holds `series`.
    Written { path: PathBuf, series: PriceSeries },
    /// The provider returned no rows; nothing was written.
    NoData,
}

impl ExportOutcome {
    /// Number of records written (0 when there was no data).
    pub fn records(&self) -> usize {
        match self {
            ExportOutcome::Written { series, .. } => series.len(),
            ExportOutcome::NoData => 0,
        }
    }
}

/// Reduce a raw provider table to the two-column output series.
pub fn shape_table(table: &DataFrame) -> Result<PriceSeries, SchemaError> {
    let selection = resolve_columns(table)?;
    debug!(
        date = %selection.date,
        close = %selection.close,
        resolution = ?selection.resolution,
        "resolved columns"
    );
    let projected = project(table, &selection)?;
    PriceSeries::from_frame(&projected)
}

/// Fetches a price history and persists it as CSV.
pub struct PriceSeriesExporter<'a> {
    provider: &'a dyn DataProvider,
}

impl<'a> PriceSeriesExporter<'a> {
    pub fn new(provider: &'a dyn DataProvider) -> Self {
        Self { provider }
    }

    pub fn export(&self, request: &ExportRequest) -> Result<ExportOutcome, ExportError> {
        request.validate()?;

        let fetched = self.provider.fetch(&request.fetch_request())?;
        if fetched.is_empty() {
            info!(
                symbol = %fetched.symbol,
                provider = self.provider.name(),
                "no data found, output not written"
            );
            return Ok(ExportOutcome::NoData);
        }

        let series = shape_table(&fetched.table)?;
        let written = write_csv(&series, &request.output_path)?;
        info!(
            symbol = %fetched.symbol,
            source = ?fetched.source,
            records = written,
            path = %request.output_path.display(),
            "wrote price series"
        );

        Ok(ExportOutcome::Written {
            path: request.output_path.clone(),
            series,
        })
    }
}
