//! Pure indicator functions over chronological price/volume sequences.
//!
//! Every function returns `None` (or the neutral variant) when the sequence is
//! too short, so callers can tell "not enough history" apart from a real zero.

use crate::domain::snapshot::{Reversal, Trend};

pub const RSI_PERIOD: usize = 14;
pub const TREND_PERIOD: usize = 5;
pub const VOLUME_WINDOW: usize = 20;

const TREND_BAND: f64 = 0.02;

/// Relative Strength Index over the last `period` deltas.
///
/// Plain averages of gains and losses (no Wilder smoothing), recomputed from
/// scratch. With no losses `rs` is pinned to 100, so the result tops out at
/// ~99.0099 rather than 100.
///
/// Needs `period + 1` prices; returns `None` otherwise.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let window = &prices[prices.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;
    let rs = if avg_loss == 0.0 {
        100.0
    } else {
        avg_gain / avg_loss
    };

    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Compares the mean of the last `period` prices with the `period` before.
pub fn trend(prices: &[f64], period: usize) -> Trend {
    if period == 0 || prices.len() < 2 * period {
        return Trend::Neutral;
    }

    let n = prices.len();
    let recent = mean(&prices[n - period..]);
    let prior = mean(&prices[n - 2 * period..n - period]);

    if recent > prior * (1.0 + TREND_BAND) {
        Trend::Bullish
    } else if recent < prior * (1.0 - TREND_BAND) {
        Trend::Bearish
    } else {
        Trend::Neutral
    }
}

/// Three-bar upside reversal on the last three closes `a, b, c`: a down bar
/// (`b < a`) followed by a close that clears both the dip and the bar before it.
pub fn reversal(prices: &[f64]) -> Reversal {
    let [a, b, c] = match prices {
        [.., a, b, c] => [*a, *b, *c],
        _ => return Reversal::None,
    };

    if b < a && c > b && c > a {
        Reversal::UpsideReversal
    } else {
        Reversal::None
    }
}

/// Mean volume of the trailing `window` samples, current sample included.
pub fn average_volume(volumes: &[u64], window: usize) -> Option<f64> {
    if window == 0 || volumes.len() < window {
        return None;
    }
    let tail = &volumes[volumes.len() - window..];
    Some(tail.iter().map(|v| *v as f64).sum::<f64>() / window as f64)
}

/// Current volume over the trailing average.
pub fn volume_ratio(volumes: &[u64], window: usize) -> Option<f64> {
    let avg = average_volume(volumes, window)?;
    if avg <= 0.0 {
        return None;
    }
    let current = *volumes.last()? as f64;
    Some(current / avg)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
