pub mod analysis;
pub mod analyzer;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";
    const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 8;
    const DEFAULT_SCAN_CONCURRENCY: usize = 8;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: Option<String>,
        pub market_data_timeout_secs: Option<u64>,
        pub scan_concurrency: Option<usize>,
        pub universe_file: Option<String>,
        pub finnhub_api_key: Option<String>,
        pub finnhub_base_url: Option<String>,
        pub newsapi_api_key: Option<String>,
        pub newsapi_base_url: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL").ok(),
                market_data_timeout_secs: parse_env("MARKET_DATA_TIMEOUT_SECS")?,
                scan_concurrency: parse_env("SCAN_CONCURRENCY")?,
                universe_file: std::env::var("UNIVERSE_FILE")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                finnhub_api_key: std::env::var("FINNHUB_API_KEY").ok(),
                finnhub_base_url: std::env::var("FINNHUB_BASE_URL").ok(),
                newsapi_api_key: std::env::var("NEWSAPI_API_KEY").ok(),
                newsapi_base_url: std::env::var("NEWSAPI_BASE_URL").ok(),
            })
        }

        pub fn market_data_base_url(&self) -> &str {
            self.market_data_base_url
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(DEFAULT_MARKET_DATA_BASE_URL)
        }

        pub fn fetch_timeout(&self) -> Duration {
            Duration::from_secs(
                self.market_data_timeout_secs
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            )
        }

        pub fn scan_concurrency(&self) -> usize {
            self.scan_concurrency
                .unwrap_or(DEFAULT_SCAN_CONCURRENCY)
                .max(1)
        }

        pub fn require_finnhub_api_key(&self) -> anyhow::Result<&str> {
            self.finnhub_api_key
                .as_deref()
                .context("FINNHUB_API_KEY is required")
        }

        pub fn require_newsapi_api_key(&self) -> anyhow::Result<&str> {
            self.newsapi_api_key
                .as_deref()
                .context("NEWSAPI_API_KEY is required")
        }
    }

    fn parse_env<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => {
                let v = s
                    .trim()
                    .parse::<T>()
                    .with_context(|| format!("{key} must be a number (got {s:?})"))?;
                Ok(Some(v))
            }
            _ => Ok(None),
        }
    }

}
