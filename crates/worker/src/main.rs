use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockscore_core::analysis::ranking::{ScanCriteria, MARKET_LIMIT, SCANNER_LIMIT};
use stockscore_core::analyzer::Analyzer;
use stockscore_core::domain::catalog::Catalog;
use stockscore_core::domain::recommendation::ScoreResult;
use stockscore_core::domain::ticker::{normalize_ticker, normalize_tickers};
use stockscore_core::ingest::provider::YahooChartProvider;

#[derive(Debug, Parser)]
#[command(name = "stockscore_worker")]
struct Args {
    /// Print one line per ticker instead of JSON.
    #[arg(long, global = true)]
    summary: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a single ticker.
    Analyze { ticker: String },

    /// Rank a sector from the universe catalog.
    Sector {
        id: String,
        #[arg(long, default_value_t = MARKET_LIMIT)]
        limit: usize,
    },

    /// Rank a market from the universe catalog.
    Market {
        id: String,
        #[arg(long, default_value_t = MARKET_LIMIT)]
        limit: usize,
    },

    /// Rank the scanner universe, optionally filtered.
    Scan {
        /// oversold | volume-spike | reversal | bullish | value | momentum
        #[arg(long)]
        criteria: Option<String>,
        #[arg(long, default_value_t = SCANNER_LIMIT)]
        limit: usize,
    },

    /// Rank an explicit list of tickers (no limit).
    Custom {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stockscore_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let catalog = Catalog::from_settings(&settings)?;
    let provider = YahooChartProvider::from_settings(&settings)?;
    let analyzer = Analyzer::from_settings(&settings, Arc::new(provider));

    let res = run(&analyzer, &catalog, args.command).await;
    let results = match res {
        Ok(r) => r,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "worker run failed");
            return Err(err);
        }
    };

    if args.summary {
        for r in &results {
            println!(
                "{:<8} {:>3}/{} {:<22} entry {:>10.2} target {:>10.2} stop {:>10.2}",
                r.ticker,
                r.score,
                r.score_max,
                r.recommendation,
                r.plan.entry,
                r.plan.target2,
                r.plan.stop_loss
            );
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}

async fn run(analyzer: &Analyzer, catalog: &Catalog, command: Command) -> anyhow::Result<Vec<ScoreResult>> {
    match command {
        Command::Analyze { ticker } => {
            let ticker = normalize_ticker(&ticker)?;
            let result = analyzer
                .analyze(&ticker)
                .await
                .with_context(|| format!("analysis failed for {ticker}"))?;
            Ok(vec![result])
        }
        Command::Sector { id, limit } => {
            let universe = catalog
                .sector(&id)
                .with_context(|| format!("unknown sector: {id}"))?;
            Ok(analyzer.rank_batch(&universe.tickers, Some(limit)).await)
        }
        Command::Market { id, limit } => {
            let universe = catalog
                .market(&id)
                .with_context(|| format!("unknown market: {id}"))?;
            Ok(analyzer.rank_batch(&universe.tickers, Some(limit)).await)
        }
        Command::Scan { criteria, limit } => match criteria {
            Some(c) => {
                let criteria: ScanCriteria = c.parse()?;
                Ok(analyzer
                    .rank_by_criteria(&catalog.scanner, criteria, Some(limit))
                    .await)
            }
            None => Ok(analyzer.rank_batch(&catalog.scanner, Some(limit)).await),
        },
        Command::Custom { tickers } => {
            let tickers = normalize_tickers(&tickers)?;
            Ok(analyzer.rank_batch(&tickers, None).await)
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_scan_with_criteria() {
        let args = Args::try_parse_from(["stockscore_worker", "scan", "--criteria", "oversold", "--limit", "5"]).unwrap();
        match args.command {
            Command::Scan { criteria, limit } => {
                assert_eq!(criteria.as_deref(), Some("oversold"));
                assert_eq!(limit, 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn custom_requires_tickers() {
        assert!(Args::try_parse_from(["stockscore_worker", "custom"]).is_err());
        let args = Args::try_parse_from(["stockscore_worker", "--summary", "custom", "AAPL", "MSFT"]).unwrap();
        assert!(args.summary);
    }
}
