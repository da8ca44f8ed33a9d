use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockscore_core::analyzer::Analyzer;
use stockscore_core::domain::catalog::Catalog;
use stockscore_core::ingest::news::news_from_settings;
use stockscore_core::ingest::provider::YahooChartProvider;

mod error;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockscore_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let catalog = match Catalog::from_settings(&settings) {
        Ok(c) => c,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "universe catalog failed to load");
            return Err(e);
        }
    };

    let provider = YahooChartProvider::from_settings(&settings)?;
    let analyzer = Analyzer::from_settings(&settings, Arc::new(provider));
    let news = news_from_settings(&settings)?;

    tracing::info!(
        markets = catalog.markets.len(),
        sectors = catalog.sectors.len(),
        scanner = catalog.scanner.len(),
        provider = analyzer.provider_name(),
        fetch_timeout = ?settings.fetch_timeout(),
        concurrency = settings.scan_concurrency(),
        "catalog loaded"
    );

    let state = routes::AppState {
        analyzer,
        catalog: Arc::new(catalog),
        news,
    };
    let app = routes::router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &stockscore_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
