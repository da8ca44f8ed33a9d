use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stockscore_core::analysis::ranking::{self, ScanCriteria, MARKET_LIMIT, SCANNER_LIMIT};
use stockscore_core::analyzer::Analyzer;
use stockscore_core::domain::catalog::{Catalog, Universe};
use stockscore_core::domain::recommendation::{ScoreResult, Tier};
use stockscore_core::domain::snapshot::Snapshot;
use stockscore_core::domain::ticker::{normalize_ticker, normalize_tickers};
use stockscore_core::ingest::news::{NewsArticle, NewsProvider, NEWS_LIMIT};
use stockscore_core::time::session::{format_session_hour, parse_session_hour};

use crate::error::ApiError;

const ENDPOINTS: &[&str] = &[
    "GET  /api/health",
    "GET  /api/stock/:ticker",
    "POST /api/stocks",
    "POST /api/analyze",
    "GET  /api/market/:market/:hour",
    "GET  /api/sectors",
    "GET  /api/sector/:sector",
    "POST /api/custom",
    "GET  /api/scanner",
    "GET  /api/scanner/:criteria",
    "GET  /api/news/:ticker",
];

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Analyzer,
    pub catalog: Arc<Catalog>,
    pub news: Arc<dyn NewsProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/stock/:ticker", get(get_stock))
        .route("/api/stocks", post(post_stocks))
        .route("/api/analyze", post(post_analyze))
        .route("/api/market/:market/:hour", get(get_market))
        .route("/api/sectors", get(get_sectors))
        .route("/api/sector/:sector", get(get_sector))
        .route("/api/custom", post(post_custom))
        .route("/api/scanner", get(get_scanner))
        .route("/api/scanner/:criteria", get(get_scanner_by_criteria))
        .route("/api/news/:ticker", get(get_news))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

fn ok<T>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: DateTime<Utc>,
    provider: &'static str,
    endpoints: &'static [&'static str],
}

async fn health(State(state): State<AppState>) -> Json<Envelope<Health>> {
    ok(Health {
        status: "ok",
        timestamp: Utc::now(),
        provider: state.analyzer.provider_name(),
        endpoints: ENDPOINTS,
    })
}

async fn get_stock(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Envelope<Snapshot>>, ApiError> {
    let ticker = normalize_ticker(&ticker)?;
    tracing::info!(%ticker, "fetching snapshot");
    let snapshot = state.analyzer.snapshot(&ticker).await?;
    Ok(ok(snapshot))
}

#[derive(Debug, Deserialize)]
struct TickersRequest {
    #[serde(default)]
    tickers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct FailedTicker {
    ticker: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct BatchSnapshots {
    total: usize,
    successful: usize,
    failed: usize,
    stocks: Vec<Snapshot>,
    errors: Vec<FailedTicker>,
}

async fn post_stocks(
    State(state): State<AppState>,
    payload: Result<Json<TickersRequest>, JsonRejection>,
) -> Result<Json<Envelope<BatchSnapshots>>, ApiError> {
    let Json(req) = payload?;
    let tickers = normalize_tickers(&req.tickers)?;
    tracing::info!(count = tickers.len(), "fetching snapshots");

    let mut stocks = Vec::with_capacity(tickers.len());
    let mut errors = Vec::new();
    for (ticker, res) in state.analyzer.snapshots(&tickers).await {
        match res {
            Ok(s) => stocks.push(s),
            Err(err) => errors.push(FailedTicker {
                ticker,
                error: err.to_string(),
            }),
        }
    }

    Ok(ok(BatchSnapshots {
        total: tickers.len(),
        successful: stocks.len(),
        failed: errors.len(),
        stocks,
        errors,
    }))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    ticker: Option<String>,
}

async fn post_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Envelope<ScoreResult>>, ApiError> {
    let Json(req) = payload?;
    let raw = req
        .ticker
        .ok_or_else(|| ApiError::BadRequest("ticker is required".into()))?;
    let ticker = normalize_ticker(&raw)?;
    tracing::info!(%ticker, "analyzing");
    let result = state.analyzer.analyze(&ticker).await?;
    Ok(ok(result))
}

/// Compact row shown next to the full results in ranked views.
#[derive(Debug, Serialize)]
struct RecommendationSummary {
    ticker: String,
    score: i32,
    tier: Tier,
    recommendation: String,
    entry: f64,
    target: f64,
    stop_loss: f64,
}

impl From<&ScoreResult> for RecommendationSummary {
    fn from(r: &ScoreResult) -> Self {
        Self {
            ticker: r.ticker.clone(),
            score: r.score,
            tier: r.tier,
            recommendation: r.recommendation.clone(),
            entry: r.plan.entry,
            target: r.plan.target2,
            stop_loss: r.plan.stop_loss,
        }
    }
}

#[derive(Debug, Serialize)]
struct RankedView {
    universe: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    criteria: Option<ScanCriteria>,
    timestamp: DateTime<Utc>,
    requested: usize,
    total: usize,
    results: Vec<ScoreResult>,
    recommendations: Vec<RecommendationSummary>,
}

impl RankedView {
    fn new(universe: &str, name: &str, requested: usize, total: usize, results: Vec<ScoreResult>) -> Self {
        let recommendations = results.iter().map(RecommendationSummary::from).collect();
        Self {
            universe: universe.to_string(),
            name: name.to_string(),
            hour: None,
            criteria: None,
            timestamp: Utc::now(),
            requested,
            total,
            results,
            recommendations,
        }
    }
}

/// Scores every ticker, then ranks. `total` counts the tickers that scored.
async fn rank_universe(
    analyzer: &Analyzer,
    id: &str,
    name: &str,
    tickers: &[String],
    criteria: Option<ScanCriteria>,
    limit: Option<usize>,
) -> RankedView {
    let results = analyzer.analyze_all(tickers).await;
    let total = results.iter().filter(|r| r.is_ok()).count();
    let ranked = match criteria {
        Some(c) => ranking::rank_by_criteria(results, c, limit),
        None => ranking::rank(results, limit),
    };
    let mut view = RankedView::new(id, name, tickers.len(), total, ranked);
    view.criteria = criteria;
    view
}

async fn get_market(
    State(state): State<AppState>,
    Path((market, hour)): Path<(String, String)>,
) -> Result<Json<Envelope<RankedView>>, ApiError> {
    let universe = state
        .catalog
        .market(&market)
        .ok_or_else(|| ApiError::NotFound(format!("unknown market: {market}")))?;
    let hour = parse_session_hour(&hour).map_err(|e| ApiError::BadRequest(format!("{e:#}")))?;

    tracing::info!(market = %universe.id, hour = %format_session_hour(hour), "ranking market");
    let mut view = rank_universe(
        &state.analyzer,
        &universe.id,
        &universe.name,
        &universe.tickers,
        None,
        Some(MARKET_LIMIT),
    )
    .await;
    view.hour = Some(format_session_hour(hour));
    Ok(ok(view))
}

#[derive(Debug, Serialize)]
struct UniverseInfo {
    id: String,
    name: String,
    description: String,
    tickers: Vec<String>,
}

impl From<&Universe> for UniverseInfo {
    fn from(u: &Universe) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            description: u.description.clone(),
            tickers: u.tickers.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CatalogView {
    markets: Vec<UniverseInfo>,
    sectors: Vec<UniverseInfo>,
    scanner_size: usize,
    criteria: Vec<ScanCriteria>,
}

async fn get_sectors(State(state): State<AppState>) -> Json<Envelope<CatalogView>> {
    let c = &state.catalog;
    ok(CatalogView {
        markets: c.markets.iter().map(UniverseInfo::from).collect(),
        sectors: c.sectors.iter().map(UniverseInfo::from).collect(),
        scanner_size: c.scanner.len(),
        criteria: ScanCriteria::ALL.to_vec(),
    })
}

async fn get_sector(
    State(state): State<AppState>,
    Path(sector): Path<String>,
) -> Result<Json<Envelope<RankedView>>, ApiError> {
    let universe = state
        .catalog
        .sector(&sector)
        .ok_or_else(|| ApiError::NotFound(format!("unknown sector: {sector}")))?;

    tracing::info!(sector = %universe.id, "ranking sector");
    let view = rank_universe(
        &state.analyzer,
        &universe.id,
        &universe.name,
        &universe.tickers,
        None,
        Some(MARKET_LIMIT),
    )
    .await;
    Ok(ok(view))
}

async fn post_custom(
    State(state): State<AppState>,
    payload: Result<Json<TickersRequest>, JsonRejection>,
) -> Result<Json<Envelope<RankedView>>, ApiError> {
    let Json(req) = payload?;
    let tickers = normalize_tickers(&req.tickers)?;
    tracing::info!(count = tickers.len(), "ranking custom list");
    let view = rank_universe(&state.analyzer, "custom", "Custom list", &tickers, None, None).await;
    Ok(ok(view))
}

async fn get_scanner(State(state): State<AppState>) -> Json<Envelope<RankedView>> {
    let view = rank_universe(
        &state.analyzer,
        "scanner",
        "Scanner",
        &state.catalog.scanner,
        None,
        Some(SCANNER_LIMIT),
    )
    .await;
    ok(view)
}

async fn get_scanner_by_criteria(
    State(state): State<AppState>,
    Path(criteria): Path<String>,
) -> Result<Json<Envelope<RankedView>>, ApiError> {
    let criteria: ScanCriteria = criteria.parse()?;
    tracing::info!(%criteria, "running scanner");
    let view = rank_universe(
        &state.analyzer,
        "scanner",
        "Scanner",
        &state.catalog.scanner,
        Some(criteria),
        Some(SCANNER_LIMIT),
    )
    .await;
    Ok(ok(view))
}

#[derive(Debug, Serialize)]
struct NewsView {
    ticker: String,
    articles: Vec<NewsArticle>,
}

async fn get_news(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<Envelope<NewsView>>, ApiError> {
    let ticker = normalize_ticker(&ticker)?;
    let articles = state
        .news
        .fetch_news(&ticker, NEWS_LIMIT)
        .await
        .map_err(|error| ApiError::Upstream {
            ticker: ticker.clone(),
            error,
        })?;
    Ok(ok(NewsView { ticker, articles }))
}
