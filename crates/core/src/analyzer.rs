use crate::analysis::ranking::{self, ScanCriteria};
use crate::analysis::scoring::score;
use crate::analysis::snapshot::build_snapshot;
use crate::config::Settings;
use crate::domain::market::MarketHistory;
use crate::domain::recommendation::ScoreResult;
use crate::domain::snapshot::Snapshot;
use crate::error::AnalysisError;
use crate::ingest::provider::MarketDataProvider;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Entry point for single-ticker analysis and batch ranking.
///
/// Each ticker is fetched and scored independently with its own timeout.
/// Batches run with at most `concurrency` fetches in flight, in completion
/// order, and are joined back into input order before ranking; a failed
/// ticker is logged and left out.
#[derive(Clone)]
pub struct Analyzer {
    provider: Arc<dyn MarketDataProvider>,
    fetch_timeout: Duration,
    concurrency: usize,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn MarketDataProvider>, fetch_timeout: Duration, concurrency: usize) -> Self {
        Self {
            provider,
            fetch_timeout,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_settings(settings: &Settings, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self::new(provider, settings.fetch_timeout(), settings.scan_concurrency())
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    async fn history(&self, ticker: &str) -> Result<MarketHistory, AnalysisError> {
        match tokio::time::timeout(self.fetch_timeout, self.provider.fetch_history(ticker)).await {
            Ok(Ok(history)) => Ok(history),
            Ok(Err(err)) => Err(AnalysisError::from_provider(ticker, err)),
            Err(_) => Err(AnalysisError::UpstreamUnavailable {
                ticker: ticker.to_string(),
                reason: format!("timed out after {:?}", self.fetch_timeout),
            }),
        }
    }

    pub async fn snapshot(&self, ticker: &str) -> Result<Snapshot, AnalysisError> {
        let history = self.history(ticker).await?;
        build_snapshot(&history)
    }

    pub async fn analyze(&self, ticker: &str) -> Result<ScoreResult, AnalysisError> {
        let snapshot = self.snapshot(ticker).await?;
        Ok(score(&snapshot))
    }

    /// Snapshots for every ticker, in input order, failures included.
    pub async fn snapshots(&self, tickers: &[String]) -> Vec<(String, Result<Snapshot, AnalysisError>)> {
        let mut out: Vec<(usize, String, Result<Snapshot, AnalysisError>)> =
            stream::iter(tickers.iter().cloned().enumerate())
                .map(|(i, ticker)| async move {
                    let res = self.snapshot(&ticker).await;
                    (i, ticker, res)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        out.sort_by_key(|(i, _, _)| *i);
        out.into_iter().map(|(_, ticker, res)| (ticker, res)).collect()
    }

    /// Score results for every ticker, in input order, failures included.
    pub async fn analyze_all(&self, tickers: &[String]) -> Vec<Result<ScoreResult, AnalysisError>> {
        let started = Instant::now();
        let mut indexed: Vec<(usize, Result<ScoreResult, AnalysisError>)> =
            stream::iter(tickers.iter().cloned().enumerate())
                .map(|(i, ticker)| async move { (i, self.analyze(&ticker).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        // Completion order is arbitrary; ranking ties fall back to input order.
        indexed.sort_by_key(|(i, _)| *i);
        let results: Vec<Result<ScoreResult, AnalysisError>> =
            indexed.into_iter().map(|(_, res)| res).collect();

        let mut failed = 0usize;
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            failed += 1;
            tracing::warn!(ticker = err.ticker().unwrap_or("?"), error = %err, "ticker analysis failed; omitting");
        }
        tracing::info!(
            requested = tickers.len(),
            succeeded = results.len() - failed,
            failed,
            elapsed_ms = started.elapsed().as_millis(),
            provider = self.provider_name(),
            "batch analysis finished"
        );

        results
    }

    pub async fn rank_batch(&self, tickers: &[String], limit: Option<usize>) -> Vec<ScoreResult> {
        ranking::rank(self.analyze_all(tickers).await, limit)
    }

    pub async fn rank_by_criteria(
        &self,
        tickers: &[String],
        criteria: ScanCriteria,
        limit: Option<usize>,
    ) -> Vec<ScoreResult> {
        ranking::rank_by_criteria(self.analyze_all(tickers).await, criteria, limit)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::snapshot::tests::history;
    use crate::domain::recommendation::Tier;
    use crate::error::ProviderError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory provider; tickers listed in `slow` never answer in time.
    #[derive(Default)]
    pub(crate) struct FakeProvider {
        pub(crate) histories: HashMap<String, MarketHistory>,
        pub(crate) failing: HashMap<String, ProviderError>,
        pub(crate) slow: Vec<String>,
        pub(crate) in_flight: AtomicUsize,
        pub(crate) max_in_flight: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for FakeProvider {
        fn provider_name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_history(&self, ticker: &str) -> Result<MarketHistory, ProviderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.slow.iter().any(|t| t == ticker) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(err) = self.failing.get(ticker) {
                return Err(err.clone());
            }
            self.histories
                .get(ticker)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))
        }
    }

    /// Wide swings, then a dip and a breakout bar on heavy volume.
    /// RSI ~54 (+20), +8.9% (+25), reversal (+30), 4x volume (+25), bullish (+20) = 120.
    pub(crate) fn strong_history(ticker: &str) -> MarketHistory {
        let mut closes = vec![100.0; 15];
        closes.extend([
            100.0, 90.0, 100.0, 90.0, 100.0, 90.0, 100.0, 90.0, 100.0, 90.0, 100.0, 98.0, 104.0,
            101.0, 110.0,
        ]);
        let mut volumes = vec![1_000_u64; 29];
        volumes.push(5_000);
        history(ticker, &closes, &volumes, None)
    }

    /// Choppy 100/101 range ending slightly up: RSI ~48 (+20), +0.5% (+5) = 25.
    pub(crate) fn weak_history(ticker: &str) -> MarketHistory {
        let mut closes: Vec<f64> = (0..29).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        closes.push(100.5);
        history(ticker, &closes, &vec![1_000; 30], None)
    }

    fn analyzer(provider: FakeProvider) -> (Analyzer, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let a = Analyzer::new(provider.clone(), Duration::from_millis(200), 4);
        (a, provider)
    }

    fn tickers(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn analyzes_a_single_ticker() {
        let mut p = FakeProvider::default();
        p.histories.insert("NVDA".into(), strong_history("NVDA"));
        let (a, _) = analyzer(p);

        let r = a.analyze("NVDA").await.unwrap();
        assert_eq!(r.score, 120, "reasons: {:?}", r.reasons);
        assert_eq!(r.tier, Tier::StrongImmediateBuy);
        assert_eq!(r.plan.entry, 110.0);
        assert_eq!(r.plan.target2, 115.5);
    }

    #[tokio::test]
    async fn unknown_ticker_is_not_found() {
        let (a, _) = analyzer(FakeProvider::default());
        assert!(matches!(
            a.analyze("NOPE").await,
            Err(AnalysisError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn slow_fetch_times_out_for_that_ticker_only() {
        let mut p = FakeProvider::default();
        p.histories.insert("AAPL".into(), weak_history("AAPL"));
        p.histories.insert("SLOW".into(), weak_history("SLOW"));
        p.slow.push("SLOW".into());
        let (a, _) = analyzer(p);

        let results = a.analyze_all(&tickers(&["SLOW", "AAPL"])).await;
        assert!(matches!(
            results[0],
            Err(AnalysisError::UpstreamUnavailable { ref reason, .. }) if reason.contains("timed out")
        ));
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn rank_batch_drops_failures_and_orders_by_score() {
        let mut p = FakeProvider::default();
        p.histories.insert("A".into(), weak_history("A"));
        p.histories.insert("B".into(), strong_history("B"));
        p.failing.insert(
            "C".into(),
            ProviderError::Http {
                status: 502,
                body: "bad gateway".into(),
            },
        );
        let (a, _) = analyzer(p);

        let out = a.rank_batch(&tickers(&["A", "B", "C"]), Some(10)).await;
        let order: Vec<&str> = out.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn rank_by_criteria_filters_before_limit() {
        let mut p = FakeProvider::default();
        for t in ["W1", "W2", "W3"] {
            p.histories.insert(t.into(), weak_history(t));
        }
        p.histories.insert("S".into(), strong_history("S"));
        let (a, _) = analyzer(p);

        let out = a
            .rank_by_criteria(&tickers(&["W1", "S", "W2", "W3"]), ScanCriteria::Reversal, Some(1))
            .await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ticker, "S");

        let out = a
            .rank_by_criteria(&tickers(&["W1", "W2"]), ScanCriteria::Oversold, None)
            .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn batch_respects_concurrency_bound() {
        let mut p = FakeProvider::default();
        let names: Vec<String> = (0..12).map(|i| format!("T{i}")).collect();
        for t in &names {
            p.histories.insert(t.clone(), weak_history(t));
        }
        let (a, provider) = analyzer(p);

        let snaps = a.snapshots(&names).await;
        assert_eq!(snaps.len(), 12);
        assert!(snaps.iter().all(|(_, r)| r.is_ok()));
        // Input order is preserved.
        assert_eq!(snaps[3].0, "T3");
        let peak = provider.max_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 4, "peak in flight {peak}");
        assert!(peak >= 2, "fetches did not overlap");
    }

    #[tokio::test]
    async fn rank_batch_runs_on_a_spawned_task() {
        let mut p = FakeProvider::default();
        p.histories.insert("A".into(), weak_history("A"));
        p.histories.insert("B".into(), strong_history("B"));
        let (a, _) = analyzer(p);

        let t = tickers(&["A", "B"]);
        let out = tokio::spawn(async move { a.rank_batch(&t, None).await })
            .await
            .unwrap();
        assert_eq!(out[0].ticker, "B");
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn slow_tickers_do_not_hold_finished_slots() {
        let mut p = FakeProvider::default();
        for t in ["S1", "A", "S2", "B", "S3", "C"] {
            p.histories.insert(t.into(), weak_history(t));
        }
        p.slow = tickers(&["S1", "S2", "S3"]);
        let provider = Arc::new(p);
        let a = Analyzer::new(provider, Duration::from_millis(200), 2);

        let started = Instant::now();
        let results = a.analyze_all(&tickers(&["S1", "A", "S2", "B", "S3", "C"])).await;
        let elapsed = started.elapsed();

        // Two timeout periods with both slots busy; in-order buffering would need three.
        assert!(elapsed < Duration::from_millis(550), "elapsed {elapsed:?}");
        let ok: Vec<bool> = results.iter().map(|r| r.is_ok()).collect();
        assert_eq!(ok, vec![false, true, false, true, false, true]);
    }

    #[tokio::test]
    async fn repeated_analysis_is_identical() {
        let mut p = FakeProvider::default();
        p.histories.insert("MSFT".into(), strong_history("MSFT"));
        let (a, _) = analyzer(p);
        let first = a.analyze("MSFT").await.unwrap();
        let second = a.analyze("MSFT").await.unwrap();
        assert_eq!(first, second);
    }
}
