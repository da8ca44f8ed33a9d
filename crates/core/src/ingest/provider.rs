use crate::config::Settings;
use crate::domain::market::MarketHistory;
use crate::error::ProviderError;
use crate::ingest::types::ChartResponse;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;

const DEFAULT_RETRIES: u32 = 1;
const DEFAULT_RANGE: &str = "1y";
const DEFAULT_INTERVAL: &str = "1d";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Source of daily price/volume history plus quote metadata for one ticker.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_history(&self, ticker: &str) -> Result<MarketHistory, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
    range: String,
    retries: u32,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let retries = std::env::var("MARKET_DATA_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES)
            .max(1);

        let range = std::env::var("MARKET_DATA_RANGE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_RANGE.to_string());

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(settings.fetch_timeout())
            .default_headers(headers)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: settings.market_data_base_url().to_string(),
            range,
            retries,
        })
    }

    fn url(&self, ticker: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            ticker
        )
    }

    async fn fetch_once(&self, ticker: &str) -> Result<MarketHistory, ProviderError> {
        let res = self
            .http
            .get(self.url(ticker))
            .query(&[("interval", DEFAULT_INTERVAL), ("range", self.range.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Yahoo answers unknown symbols with 404 and a chart.error body.
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(ticker.to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: truncate(&text, 200),
            });
        }

        let parsed = serde_json::from_str::<ChartResponse>(&text)
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        parsed.into_history(ticker)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_history(&self, ticker: &str) -> Result<MarketHistory, ProviderError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(ticker).await {
                Ok(history) => return Ok(history),
                Err(err) => {
                    if attempt >= self.retries || !is_retryable(&err) {
                        return Err(err);
                    }
                    let backoff = Duration::from_millis(250 << (attempt - 1));
                    tracing::warn!(attempt, ?backoff, %ticker, error = %err, "market data fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn is_retryable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Network(_) => true,
        ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
