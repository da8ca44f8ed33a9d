use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reversal {
    None,
    UpsideReversal,
}

/// Normalized point-in-time indicator bundle for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ticker: String,
    pub price: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    /// `None` when the history is too short; never scored as zero.
    pub rsi: Option<f64>,
    pub trend: Trend,
    pub reversal: Reversal,
    pub volume: u64,
    pub average_volume: Option<f64>,
    pub volume_ratio: Option<f64>,
    /// Quote price over EPS, with the divisor falling back to 1 when EPS is
    /// missing or zero. See [`Snapshot::valuation_pe`].
    pub pe: f64,
    pub eps: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub recent_prices: Vec<f64>,
}

impl Snapshot {
    /// P/E usable as a valuation signal: only when earnings are known and positive.
    pub fn valuation_pe(&self) -> Option<f64> {
        match self.eps {
            Some(eps) if eps > 0.0 && self.pe.is_finite() => Some(self.pe),
            _ => None,
        }
    }
}
