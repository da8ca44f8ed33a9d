use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One daily bar as handed over by the market-data provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteMeta {
    pub currency: Option<String>,
    pub market_cap: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub eps_current_year: Option<f64>,
    pub regular_market_time: Option<DateTime<Utc>>,
}

/// Chronological one-year daily history plus current quote metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketHistory {
    pub ticker: String,
    pub samples: Vec<PriceSample>,
    pub meta: QuoteMeta,
}

impl MarketHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.close).collect()
    }

    pub fn volumes(&self) -> Vec<u64> {
        self.samples.iter().map(|s| s.volume).collect()
    }
}
