use crate::domain::snapshot::{Reversal, Trend};
use serde::{Deserialize, Serialize};

pub const SCORE_MAX: i32 = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Rsi,
    Momentum,
    Reversal,
    Volume,
    Valuation,
    Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    pub kind: ReasonKind,
    pub text: String,
    pub points: i32,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    StrongImmediateBuy,
    StrongBuy,
    Consider,
    Neutral,
    Avoid,
}

impl Tier {
    /// Threshold ladder, top-down; thresholds are inclusive.
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 120 => Tier::StrongImmediateBuy,
            s if s >= 100 => Tier::StrongBuy,
            s if s >= 80 => Tier::Consider,
            s if s >= 60 => Tier::Neutral,
            _ => Tier::Avoid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::StrongImmediateBuy => "Strong immediate buy",
            Tier::StrongBuy => "Strong buy",
            Tier::Consider => "Consider",
            Tier::Neutral => "Neutral",
            Tier::Avoid => "Avoid",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            Tier::StrongImmediateBuy => "Enter now",
            Tier::StrongBuy => "Buy on dips",
            Tier::Consider => "Wait for confirmation",
            Tier::Neutral => "Wait for a clear signal",
            Tier::Avoid => "Wait, negative signals",
        }
    }

    pub fn urgency(self) -> &'static str {
        match self {
            Tier::StrongImmediateBuy => "immediate",
            Tier::StrongBuy => "high",
            Tier::Consider => "medium",
            Tier::Neutral => "low",
            Tier::Avoid => "none",
        }
    }

    pub fn probability(self) -> &'static str {
        match self {
            Tier::StrongImmediateBuy => "85%+",
            Tier::StrongBuy => "75-85%",
            Tier::Consider => "65-75%",
            Tier::Neutral => "50-65%",
            Tier::Avoid => "<50%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub entry: f64,
    pub target1: f64,
    pub target2: f64,
    pub stop_loss: f64,
}

/// Indicator values the score was computed from, echoed for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValues {
    pub rsi: Option<f64>,
    pub trend: Trend,
    pub reversal: Reversal,
    pub volume: u64,
    pub volume_ratio: Option<f64>,
    pub pe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub ticker: String,
    pub price: f64,
    pub change_percent: f64,
    pub score: i32,
    pub score_max: i32,
    pub reasons: Vec<Reason>,
    pub tier: Tier,
    pub recommendation: String,
    pub action: String,
    pub urgency: String,
    pub probability: String,
    pub confidence: f64,
    pub plan: TradePlan,
    pub indicators: IndicatorValues,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive() {
        assert_eq!(Tier::from_score(150), Tier::StrongImmediateBuy);
        assert_eq!(Tier::from_score(120), Tier::StrongImmediateBuy);
        assert_eq!(Tier::from_score(119), Tier::StrongBuy);
        assert_eq!(Tier::from_score(100), Tier::StrongBuy);
        assert_eq!(Tier::from_score(99), Tier::Consider);
        assert_eq!(Tier::from_score(80), Tier::Consider);
        assert_eq!(Tier::from_score(79), Tier::Neutral);
        assert_eq!(Tier::from_score(60), Tier::Neutral);
        assert_eq!(Tier::from_score(59), Tier::Avoid);
        assert_eq!(Tier::from_score(0), Tier::Avoid);
    }

    #[test]
    fn tier_serializes_snake_case() {
        let v = serde_json::to_value(Tier::StrongImmediateBuy).unwrap();
        assert_eq!(v, serde_json::json!("strong_immediate_buy"));
    }
}
