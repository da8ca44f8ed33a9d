use crate::domain::recommendation::ScoreResult;
use crate::domain::snapshot::{Reversal, Trend};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result count for market and sector views.
pub const MARKET_LIMIT: usize = 10;
/// Result count for scanner views.
pub const SCANNER_LIMIT: usize = 15;

/// Scanner filters applied before sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanCriteria {
    /// RSI below 30.
    Oversold,
    /// Volume more than 1.8x its trailing average.
    VolumeSpike,
    Reversal,
    Bullish,
    /// Known P/E below 20.
    Value,
    /// Daily change above 3%.
    Momentum,
}

impl ScanCriteria {
    pub const ALL: [ScanCriteria; 6] = [
        ScanCriteria::Oversold,
        ScanCriteria::VolumeSpike,
        ScanCriteria::Reversal,
        ScanCriteria::Bullish,
        ScanCriteria::Value,
        ScanCriteria::Momentum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScanCriteria::Oversold => "oversold",
            ScanCriteria::VolumeSpike => "volume-spike",
            ScanCriteria::Reversal => "reversal",
            ScanCriteria::Bullish => "bullish",
            ScanCriteria::Value => "value",
            ScanCriteria::Momentum => "momentum",
        }
    }

    pub fn matches(self, r: &ScoreResult) -> bool {
        let ind = &r.indicators;
        match self {
            ScanCriteria::Oversold => ind.rsi.is_some_and(|v| v < 30.0),
            ScanCriteria::VolumeSpike => ind.volume_ratio.is_some_and(|v| v > 1.8),
            ScanCriteria::Reversal => ind.reversal == Reversal::UpsideReversal,
            ScanCriteria::Bullish => ind.trend == Trend::Bullish,
            ScanCriteria::Value => ind.pe.is_some_and(|v| v < 20.0),
            ScanCriteria::Momentum => r.change_percent > 3.0,
        }
    }
}

impl fmt::Display for ScanCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanCriteria {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        ScanCriteria::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AnalysisError::InvalidInput(format!("unknown scan criteria: {s}")))
    }
}

/// Drops failures, sorts by score descending and truncates.
///
/// The sort is stable, so equal scores keep their input order. `None` keeps
/// every successful result.
pub fn rank<I>(results: I, limit: Option<usize>) -> Vec<ScoreResult>
where
    I: IntoIterator<Item = Result<ScoreResult, AnalysisError>>,
{
    select(results, |_| true, limit)
}

/// [`rank`], keeping only results that satisfy `criteria`.
pub fn rank_by_criteria<I>(results: I, criteria: ScanCriteria, limit: Option<usize>) -> Vec<ScoreResult>
where
    I: IntoIterator<Item = Result<ScoreResult, AnalysisError>>,
{
    select(results, |r| criteria.matches(r), limit)
}

fn select<I, F>(results: I, keep: F, limit: Option<usize>) -> Vec<ScoreResult>
where
    I: IntoIterator<Item = Result<ScoreResult, AnalysisError>>,
    F: Fn(&ScoreResult) -> bool,
{
    let mut ok: Vec<ScoreResult> = results
        .into_iter()
        .filter_map(Result::ok)
        .filter(|r| keep(r))
        .collect();

    ok.sort_by(|a, b| b.score.cmp(&a.score));

    if let Some(limit) = limit {
        ok.truncate(limit);
    }
    ok
}
