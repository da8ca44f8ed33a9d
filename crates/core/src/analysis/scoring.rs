use crate::analysis::round_to;
use crate::domain::recommendation::{
    IndicatorValues, Reason, ReasonKind, ScoreResult, Tier, TradePlan, SCORE_MAX,
};
use crate::domain::snapshot::{Reversal, Snapshot, Trend};

const TARGET1_MULTIPLIER: f64 = 1.02;
const TARGET2_MULTIPLIER: f64 = 1.05;
const STOP_LOSS_MULTIPLIER: f64 = 0.97;

type Signal = fn(&Snapshot) -> Option<Reason>;

// Evaluation order is part of the output: reasons are reported in this sequence.
const SIGNALS: [Signal; 6] = [
    rsi_signal,
    momentum_signal,
    reversal_signal,
    volume_signal,
    valuation_signal,
    trend_signal,
];

/// Scores one snapshot. Pure: identical input always yields an identical result.
pub fn score(snapshot: &Snapshot) -> ScoreResult {
    let reasons: Vec<Reason> = SIGNALS.iter().filter_map(|signal| signal(snapshot)).collect();
    let raw: i32 = reasons.iter().map(|r| r.points).sum();
    let score = raw.clamp(0, SCORE_MAX);
    let tier = Tier::from_score(score);

    ScoreResult {
        ticker: snapshot.ticker.clone(),
        price: snapshot.price,
        change_percent: snapshot.change_percent,
        score,
        score_max: SCORE_MAX,
        reasons,
        tier,
        recommendation: tier.label().to_string(),
        action: tier.action().to_string(),
        urgency: tier.urgency().to_string(),
        probability: tier.probability().to_string(),
        confidence: confidence(score),
        plan: trade_plan(snapshot.price),
        indicators: IndicatorValues {
            rsi: snapshot.rsi.map(|v| round_to(v, 2)),
            trend: snapshot.trend,
            reversal: snapshot.reversal,
            volume: snapshot.volume,
            volume_ratio: snapshot.volume_ratio.map(|v| round_to(v, 2)),
            pe: snapshot.valuation_pe().map(|v| round_to(v, 2)),
        },
    }
}

pub fn trade_plan(entry: f64) -> TradePlan {
    TradePlan {
        entry: round_to(entry, 2),
        target1: round_to(entry * TARGET1_MULTIPLIER, 2),
        target2: round_to(entry * TARGET2_MULTIPLIER, 2),
        stop_loss: round_to(entry * STOP_LOSS_MULTIPLIER, 2),
    }
}

/// Score as a percentage of the maximum, one decimal place.
pub fn confidence(score: i32) -> f64 {
    round_to(score as f64 / SCORE_MAX as f64 * 100.0, 1)
}

fn reason(kind: ReasonKind, text: String, points: i32, icon: &str) -> Option<Reason> {
    Some(Reason {
        kind,
        text,
        points,
        icon: icon.to_string(),
    })
}

fn rsi_signal(s: &Snapshot) -> Option<Reason> {
    let rsi = s.rsi?;
    if rsi < 30.0 {
        reason(ReasonKind::Rsi, format!("RSI {rsi:.1} oversold (<30)"), 35, "🟢")
    } else if (40.0..=60.0).contains(&rsi) {
        reason(ReasonKind::Rsi, format!("RSI {rsi:.1} neutral (40-60)"), 20, "⚖️")
    } else if rsi > 70.0 {
        reason(ReasonKind::Rsi, format!("RSI {rsi:.1} overbought (>70)"), -20, "🔴")
    } else {
        None
    }
}

fn momentum_signal(s: &Snapshot) -> Option<Reason> {
    let pct = s.change_percent;
    if pct > 5.0 {
        reason(ReasonKind::Momentum, format!("Strong momentum +{pct:.2}%"), 25, "🚀")
    } else if pct > 2.0 {
        reason(ReasonKind::Momentum, format!("Positive momentum +{pct:.2}%"), 15, "📈")
    } else if pct > 0.0 {
        reason(ReasonKind::Momentum, format!("Slight gain +{pct:.2}%"), 5, "↗️")
    } else {
        None
    }
}

fn reversal_signal(s: &Snapshot) -> Option<Reason> {
    match s.reversal {
        Reversal::UpsideReversal => reason(
            ReasonKind::Reversal,
            "Upside reversal on the last three closes".to_string(),
            30,
            "🔄",
        ),
        Reversal::None => None,
    }
}

fn volume_signal(s: &Snapshot) -> Option<Reason> {
    let ratio = s.volume_ratio?;
    if ratio > 1.5 {
        reason(ReasonKind::Volume, format!("Volume {ratio:.2}x average"), 25, "🔊")
    } else if ratio > 1.2 {
        reason(ReasonKind::Volume, format!("Volume {ratio:.2}x average"), 12, "🔉")
    } else {
        None
    }
}

fn valuation_signal(s: &Snapshot) -> Option<Reason> {
    let pe = s.valuation_pe()?;
    if pe < 20.0 {
        reason(ReasonKind::Valuation, format!("Low P/E {pe:.1} (<20)"), 15, "💰")
    } else if pe < 35.0 {
        reason(ReasonKind::Valuation, format!("Moderate P/E {pe:.1} (<35)"), 8, "💵")
    } else if pe > 50.0 {
        reason(ReasonKind::Valuation, format!("High P/E {pe:.1} (>50)"), -15, "⚠️")
    } else {
        None
    }
}

fn trend_signal(s: &Snapshot) -> Option<Reason> {
    match s.trend {
        Trend::Bullish => reason(ReasonKind::Trend, "Bullish short-term trend".to_string(), 20, "📈"),
        Trend::Bearish => reason(ReasonKind::Trend, "Bearish short-term trend".to_string(), -20, "📉"),
        Trend::Neutral => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::snapshot::{build_snapshot, tests::history};
    use chrono::DateTime;

    fn base() -> Snapshot {
        Snapshot {
            ticker: "TEST".into(),
            price: 100.0,
            previous_close: 100.0,
            change: 0.0,
            change_percent: 0.0,
            currency: Some("USD".into()),
            market_cap: None,
            rsi: None,
            trend: Trend::Neutral,
            reversal: Reversal::None,
            volume: 1_000,
            average_volume: None,
            volume_ratio: None,
            pe: 100.0,
            eps: None,
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            recent_prices: vec![100.0],
        }
    }

    fn kinds(r: &ScoreResult) -> Vec<ReasonKind> {
        r.reasons.iter().map(|r| r.kind).collect()
    }

    #[test]
    fn neutral_snapshot_scores_zero() {
        let r = score(&base());
        assert_eq!(r.score, 0);
        assert!(r.reasons.is_empty());
        assert_eq!(r.tier, Tier::Avoid);
        assert_eq!(r.probability, "<50%");
    }

    #[test]
    fn momentum_bands_are_exclusive() {
        let mut s = base();
        s.change_percent = 6.0;
        let r = score(&s);
        assert_eq!(r.score, 25);
        assert_eq!(r.reasons.len(), 1);
        assert_eq!(r.reasons[0].points, 25);

        s.change_percent = 3.0;
        assert_eq!(score(&s).score, 15);
        s.change_percent = 0.5;
        assert_eq!(score(&s).score, 5);
        s.change_percent = -4.0;
        assert_eq!(score(&s).score, 0);
    }

    #[test]
    fn oversold_rsi_never_also_counts_as_neutral() {
        let mut s = base();
        s.rsi = Some(25.0);
        let r = score(&s);
        assert_eq!(r.score, 35);
        assert_eq!(r.reasons.len(), 1);
        assert_eq!(r.reasons[0].kind, ReasonKind::Rsi);
    }

    #[test]
    fn rsi_gaps_contribute_nothing() {
        let mut s = base();
        for v in [35.0, 65.0, 70.0, 30.0] {
            s.rsi = Some(v);
            assert_eq!(score(&s).score, 0, "rsi {v}");
        }
        s.rsi = Some(40.0);
        assert_eq!(score(&s).score, 20);
        s.rsi = Some(60.0);
        assert_eq!(score(&s).score, 20);
    }

    #[test]
    fn short_history_rsi_contributes_zero() {
        // 13 steadily falling closes would be deeply oversold if RSI were computed.
        let closes: Vec<f64> = (0..13).map(|i| 100.0 - i as f64).collect();
        let h = history("SHORT", &closes, &vec![1_000; 13], None);
        let s = build_snapshot(&h).unwrap();
        assert_eq!(s.rsi, None);
        let r = score(&s);
        assert!(r.reasons.iter().all(|r| r.kind != ReasonKind::Rsi));
        assert_eq!(r.indicators.rsi, None);
    }

    #[test]
    fn clamps_negative_total_to_zero() {
        let mut s = base();
        s.rsi = Some(80.0);
        s.eps = Some(1.0);
        s.pe = 60.0;
        s.trend = Trend::Bearish;
        let r = score(&s);
        assert_eq!(r.reasons.iter().map(|r| r.points).sum::<i32>(), -55);
        assert_eq!(r.score, 0);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn every_signal_maxed_hits_ceiling_in_order() {
        let mut s = base();
        s.rsi = Some(25.0);
        s.change_percent = 6.0;
        s.reversal = Reversal::UpsideReversal;
        s.volume_ratio = Some(2.0);
        s.eps = Some(10.0);
        s.pe = 10.0;
        s.trend = Trend::Bullish;
        let r = score(&s);
        assert_eq!(r.score, 150);
        assert_eq!(r.confidence, 100.0);
        assert_eq!(r.tier, Tier::StrongImmediateBuy);
        assert_eq!(
            kinds(&r),
            vec![
                ReasonKind::Rsi,
                ReasonKind::Momentum,
                ReasonKind::Reversal,
                ReasonKind::Volume,
                ReasonKind::Valuation,
                ReasonKind::Trend,
            ]
        );
    }

    #[test]
    fn valuation_ignores_degenerate_pe() {
        let mut s = base();
        s.pe = 300.0;
        s.eps = None;
        assert_eq!(score(&s).score, 0);

        s.eps = Some(-2.0);
        assert_eq!(score(&s).score, 0);

        s.eps = Some(5.0);
        s.pe = 30.0;
        assert_eq!(score(&s).score, 8);
        s.pe = 55.0;
        assert_eq!(score(&s).reasons[0].points, -15);
    }

    #[test]
    fn volume_bands() {
        let mut s = base();
        s.volume_ratio = Some(1.3);
        assert_eq!(score(&s).score, 12);
        s.volume_ratio = Some(1.5);
        assert_eq!(score(&s).score, 12);
        s.volume_ratio = Some(1.51);
        assert_eq!(score(&s).score, 25);
        s.volume_ratio = Some(1.2);
        assert_eq!(score(&s).score, 0);
    }

    #[test]
    fn tier_threshold_is_inclusive() {
        // 35 + 25 + 30 + 20 + 8 = 118 -> strong buy; swap in +15 P/E for 125.
        let mut s = base();
        s.rsi = Some(25.0);
        s.change_percent = 6.0;
        s.reversal = Reversal::UpsideReversal;
        s.trend = Trend::Bullish;
        s.eps = Some(1.0);
        s.pe = 30.0;
        let r = score(&s);
        assert_eq!(r.score, 118);
        assert_eq!(r.tier, Tier::StrongBuy);
        assert_eq!(r.action, "Buy on dips");

        s.pe = 10.0;
        let r = score(&s);
        assert_eq!(r.score, 125);
        assert_eq!(r.tier, Tier::StrongImmediateBuy);
    }

    #[test]
    fn trade_plan_rounds_to_cents() {
        let plan = trade_plan(100.0);
        assert_eq!(plan.entry, 100.0);
        assert_eq!(plan.target1, 102.0);
        assert_eq!(plan.target2, 105.0);
        assert_eq!(plan.stop_loss, 97.0);

        let plan = trade_plan(187.33);
        assert_eq!(plan.target2, 196.7);
        assert_eq!(plan.stop_loss, 181.71);
    }

    #[test]
    fn confidence_has_one_decimal() {
        assert_eq!(confidence(90), 60.0);
        assert_eq!(confidence(100), 66.7);
        assert_eq!(confidence(150), 100.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let mut s = base();
        s.rsi = Some(45.0);
        s.change_percent = 2.5;
        s.volume_ratio = Some(1.6);
        let a = score(&s);
        let b = score(&s);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }
}
