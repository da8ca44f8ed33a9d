use crate::analysis::indicators::{self, RSI_PERIOD, TREND_PERIOD, VOLUME_WINDOW};
use crate::analysis::round_to;
use crate::domain::market::MarketHistory;
use crate::domain::snapshot::Snapshot;
use crate::error::AnalysisError;

const RECENT_WINDOW: usize = 20;

/// Derives a [`Snapshot`] from a provider history.
///
/// Only an empty history is a failure. Shorter histories still build; the
/// indicators they cannot support come out undefined and are skipped by scoring.
pub fn build_snapshot(history: &MarketHistory) -> Result<Snapshot, AnalysisError> {
    let last = history
        .samples
        .last()
        .ok_or_else(|| AnalysisError::InsufficientHistory {
            ticker: history.ticker.clone(),
            samples: 0,
        })?;

    let closes = history.closes();
    let volumes = history.volumes();

    let price = last.close;
    let previous_close = match closes.len() {
        0 | 1 => price,
        n => closes[n - 2],
    };
    let change = price - previous_close;
    let change_percent = if previous_close != 0.0 {
        change / previous_close * 100.0
    } else {
        0.0
    };

    let quote_price = history.meta.regular_market_price.unwrap_or(price);
    let eps = history.meta.eps_current_year;
    let divisor = eps.filter(|e| *e != 0.0).unwrap_or(1.0);

    let recent_start = closes.len().saturating_sub(RECENT_WINDOW);

    Ok(Snapshot {
        ticker: history.ticker.clone(),
        price,
        previous_close,
        change: round_to(change, 2),
        change_percent: round_to(change_percent, 2),
        currency: history.meta.currency.clone(),
        market_cap: history.meta.market_cap,
        rsi: indicators::rsi(&closes, RSI_PERIOD),
        trend: indicators::trend(&closes, TREND_PERIOD),
        reversal: indicators::reversal(&closes),
        volume: last.volume,
        average_volume: indicators::average_volume(&volumes, VOLUME_WINDOW),
        volume_ratio: indicators::volume_ratio(&volumes, VOLUME_WINDOW),
        pe: quote_price / divisor,
        eps,
        timestamp: history.meta.regular_market_time.unwrap_or(last.timestamp),
        recent_prices: closes[recent_start..].to_vec(),
    })
}
