//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API and shapes them into a
//! flat-header raw table. One request per fetch: failures surface immediately
//! to the caller, there is no retry loop.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV import path is the fallback when Yahoo is unavailable.

use super::frame::{bars_to_frame, HeaderLayout};
use super::provider::{
    DataError, DataProvider, DataSource, FetchRequest, FetchResult, PriceAdjustment, RawBar,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the provider at a different host (mirrors, local stubs).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(start_ts);
        format!(
            "{}/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true&events=div%2Csplits",
            self.base_url
        )
    }

    /// Parse a chart API body into RawBars.
    ///
    /// A result without timestamps means no trading days in range and yields
    /// an empty vector rather than an error.
    fn parse_response(symbol: &str, body: &str) -> Result<Vec<RawBar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data.indicators.quote.into_iter().next().unwrap_or_default();
        let adj_closes = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);
        let offset = data.meta.gmtoffset.unwrap_or(0);

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            // Exchange-local calendar date
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            // Bars without a close are placeholders for non-trading days
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            let adj_close = adj_closes
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .unwrap_or(close);

            bars.push(RawBar {
                date,
                open: quote.open.get(i).copied().flatten().unwrap_or(f64::NAN),
                high: quote.high.get(i).copied().flatten().unwrap_or(f64::NAN),
                low: quote.low.get(i).copied().flatten().unwrap_or(f64::NAN),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
                adj_close,
            });
        }

        Ok(bars)
    }

    /// Execute the HTTP request and map transport and status failures.
    fn fetch_bars(&self, request: &FetchRequest) -> Result<Vec<RawBar>, DataError> {
        let symbol = request.symbol.as_str();
        let url = self.chart_url(symbol, request.start, request.end);
        debug!(%url, "requesting chart");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(DataError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DataError::AuthenticationRequired(
                "Yahoo Finance requires authentication".into(),
            ));
        }

        // 404 still carries a chart error body; let the parser name the symbol
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::Http {
                status: status.as_u16(),
                symbol: symbol.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return match Self::parse_response(symbol, &body) {
                Err(e) => Err(e),
                Ok(_) => Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                }),
            };
        }

        Self::parse_response(symbol, &body)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, DataError> {
        let bars = self.fetch_bars(request)?;
        info!(
            symbol = %request.symbol,
            bars = bars.len(),
            adjustment = ?request.adjustment,
            "fetched daily bars"
        );

        let bars: Vec<RawBar> = match request.adjustment {
            PriceAdjustment::Unadjusted => bars,
            adjustment => bars.iter().map(|b| adjustment.apply(b)).collect(),
        };

        Ok(FetchResult {
            symbol: request.symbol.clone(),
            table: bars_to_frame(&bars, &HeaderLayout::Flat)?,
            source: DataSource::YahooFinance,
        })
    }
}
