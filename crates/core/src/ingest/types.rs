//! Wire shapes of the Yahoo Finance chart endpoint (`/v8/finance/chart/{ticker}`).

use crate::domain::market::{MarketHistory, PriceSample, QuoteMeta};
use crate::error::ProviderError;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub eps_current_year: Option<f64>,
    pub regular_market_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartIndicators {
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

impl ChartResponse {
    /// Converts the first chart result into a chronological history.
    ///
    /// Bars with a missing close or volume (halts, partial sessions) are skipped.
    pub fn into_history(self, ticker: &str) -> Result<MarketHistory, ProviderError> {
        if let Some(err) = self.chart.error {
            if err.code.eq_ignore_ascii_case("Not Found") {
                return Err(ProviderError::NotFound(ticker.to_string()));
            }
            return Err(ProviderError::BadResponse(format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            )));
        }

        let result = self
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;

        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::BadResponse("missing quote".into()))?;

        let mut samples = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let (Some(close), Some(volume)) = (close, volume) else {
                continue;
            };
            let timestamp = to_utc(*ts)?;
            samples.push(PriceSample {
                timestamp,
                close,
                volume,
            });
        }
        samples.sort_by_key(|s| s.timestamp);

        let meta = result.meta;
        let regular_market_time = meta.regular_market_time.map(to_utc).transpose()?;

        Ok(MarketHistory {
            ticker: ticker.to_string(),
            samples,
            meta: QuoteMeta {
                currency: meta.currency,
                market_cap: meta.market_cap,
                regular_market_price: meta.regular_market_price,
                eps_current_year: meta.eps_current_year,
                regular_market_time,
            },
        })
    }
}

fn to_utc(ts: i64) -> Result<DateTime<Utc>, ProviderError> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| ProviderError::Parse(format!("bad timestamp {ts}")))
}
