use crate::config::Settings;
use crate::error::ProviderError;
use anyhow::Context;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const NEWS_LIMIT: usize = 10;

const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io";
const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org";
const NEWS_TIMEOUT_SECS: u64 = 10;
const FINNHUB_LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: Option<String>,
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError>;
}

/// Builds the news chain from settings: Finnhub first, NewsAPI as fallback.
pub fn news_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn NewsProvider>> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(NEWS_TIMEOUT_SECS))
        .build()
        .context("failed to build news http client")?;

    let finnhub = FinnhubNews {
        http: http.clone(),
        base_url: settings
            .finnhub_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FINNHUB_BASE_URL.to_string()),
        api_key: settings.require_finnhub_api_key().ok().map(str::to_string),
    };
    let newsapi = NewsApiNews {
        http,
        base_url: settings
            .newsapi_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_NEWSAPI_BASE_URL.to_string()),
        api_key: settings.require_newsapi_api_key().ok().map(str::to_string),
    };

    Ok(Arc::new(FallbackNews::new(Arc::new(finnhub), Arc::new(newsapi))))
}

/// Tries `primary` once and falls back to `secondary` on any error.
pub struct FallbackNews {
    primary: Arc<dyn NewsProvider>,
    secondary: Arc<dyn NewsProvider>,
}

impl FallbackNews {
    pub fn new(primary: Arc<dyn NewsProvider>, secondary: Arc<dyn NewsProvider>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait::async_trait]
impl NewsProvider for FallbackNews {
    fn provider_name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        match self.primary.fetch_news(ticker, limit).await {
            Ok(articles) => Ok(articles),
            Err(err) => {
                tracing::warn!(
                    %ticker,
                    primary = self.primary.provider_name(),
                    secondary = self.secondary.provider_name(),
                    error = %err,
                    "news provider failed; falling back"
                );
                self.secondary.fetch_news(ticker, limit).await
            }
        }
    }
}

pub struct FinnhubNews {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    headline: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    source: String,
    url: String,
    #[serde(default)]
    datetime: Option<i64>,
}

impl From<FinnhubArticle> for NewsArticle {
    fn from(a: FinnhubArticle) -> Self {
        NewsArticle {
            title: a.headline,
            summary: a.summary.filter(|s| !s.trim().is_empty()),
            source: a.source,
            url: a.url,
            published_at: a.datetime.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}

#[async_trait::async_trait]
impl NewsProvider for FinnhubNews {
    fn provider_name(&self) -> &'static str {
        "finnhub"
    }

    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("FINNHUB_API_KEY"))?;

        let to = Utc::now().date_naive();
        let from = to - ChronoDuration::days(FINNHUB_LOOKBACK_DAYS);
        let url = format!("{}/api/v1/company-news", self.base_url.trim_end_matches('/'));

        let text = get_text(
            self.http.get(url).query(&[
                ("symbol", ticker.to_string()),
                ("from", from.to_string()),
                ("to", to.to_string()),
                ("token", api_key.to_string()),
            ]),
        )
        .await?;

        parse_finnhub(&text, limit)
    }
}

fn parse_finnhub(text: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
    let articles = serde_json::from_str::<Vec<FinnhubArticle>>(text)
        .map_err(|e| ProviderError::Parse(e.to_string()))?;
    Ok(articles.into_iter().take(limit).map(NewsArticle::from).collect())
}

pub struct NewsApiNews {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    source: NewsApiSource,
    url: String,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

#[async_trait::async_trait]
impl NewsProvider for NewsApiNews {
    fn provider_name(&self) -> &'static str {
        "newsapi"
    }

    async fn fetch_news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials("NEWSAPI_API_KEY"))?;

        let url = format!("{}/v2/everything", self.base_url.trim_end_matches('/'));
        let text = get_text(self.http.get(url).query(&[
            ("q", format!("{ticker} stock earnings")),
            ("sortBy", "publishedAt".to_string()),
            ("language", "en".to_string()),
            ("pageSize", limit.to_string()),
            ("apiKey", api_key.to_string()),
        ]))
        .await?;

        parse_newsapi(&text, limit)
    }
}

fn parse_newsapi(text: &str, limit: usize) -> Result<Vec<NewsArticle>, ProviderError> {
    let body = serde_json::from_str::<NewsApiResponse>(text)
        .map_err(|e| ProviderError::Parse(e.to_string()))?;
    if body.status != "ok" {
        return Err(ProviderError::BadResponse(
            body.message.unwrap_or_else(|| body.status.clone()),
        ));
    }

    Ok(body
        .articles
        .into_iter()
        .filter_map(|a| {
            let title = a.title.filter(|t| !t.trim().is_empty())?;
            Some(NewsArticle {
                title,
                summary: a.description,
                source: a.source.name.unwrap_or_default(),
                url: a.url,
                published_at: a.published_at,
            })
        })
        .take(limit)
        .collect())
}

async fn get_text(req: reqwest::RequestBuilder) -> Result<String, ProviderError> {
    let res = req
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    let status = res.status();
    let text = res
        .text()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;
    if !status.is_success() {
        return Err(ProviderError::Http {
            status: status.as_u16(),
            body: text.chars().take(200).collect(),
        });
    }
    Ok(text)
}
