use crate::config::Settings;
use crate::domain::ticker::normalize_ticker;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

const BUILTIN_UNIVERSES: &str = include_str!("../../config/universes.json");

/// Named, read-only grouping of ticker symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tickers: Vec<String>,
}

/// Markets, sectors and the scanner universe. Loaded once at startup and
/// shared immutably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub markets: Vec<Universe>,
    pub sectors: Vec<Universe>,
    pub scanner: Vec<String>,
}

impl Catalog {
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(BUILTIN_UNIVERSES).context("built-in universes.json is invalid")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read universe file {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("invalid universe file {}", path.display()))
    }

    /// `UNIVERSE_FILE` when configured, otherwise the built-in catalog.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        match settings.universe_file.as_deref() {
            Some(path) => Self::from_file(path),
            None => Self::builtin(),
        }
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let raw: Catalog = serde_json::from_str(text).context("catalog is not valid JSON")?;
        raw.validated()
    }

    fn validated(self) -> anyhow::Result<Self> {
        let mut ids = BTreeSet::new();
        let mut markets = Vec::with_capacity(self.markets.len());
        for u in self.markets {
            markets.push(u.validated(&mut ids)?);
        }
        let mut sectors = Vec::with_capacity(self.sectors.len());
        for u in self.sectors {
            sectors.push(u.validated(&mut ids)?);
        }

        let scanner = normalize_all(&self.scanner).context("invalid scanner universe")?;
        ensure!(!scanner.is_empty(), "scanner universe must be non-empty");

        Ok(Self {
            markets,
            sectors,
            scanner,
        })
    }

    pub fn market(&self, id: &str) -> Option<&Universe> {
        find(&self.markets, id)
    }

    pub fn sector(&self, id: &str) -> Option<&Universe> {
        find(&self.sectors, id)
    }
}

impl Universe {
    fn validated(self, seen_ids: &mut BTreeSet<String>) -> anyhow::Result<Self> {
        let id = self.id.trim().to_ascii_lowercase();
        ensure!(!id.is_empty(), "universe id must be non-empty");
        ensure!(seen_ids.insert(id.clone()), "duplicate universe id: {id}");

        let name = self.name.trim().to_string();
        ensure!(!name.is_empty(), "universe {id}: name must be non-empty");

        let tickers =
            normalize_all(&self.tickers).with_context(|| format!("universe {id}: bad ticker"))?;
        ensure!(!tickers.is_empty(), "universe {id}: tickers must be non-empty");

        Ok(Self {
            id,
            name,
            description: self.description.trim().to_string(),
            tickers,
        })
    }
}

fn find<'a>(universes: &'a [Universe], id: &str) -> Option<&'a Universe> {
    let id = id.trim();
    universes.iter().find(|u| u.id.eq_ignore_ascii_case(id))
}

fn normalize_all(tickers: &[String]) -> anyhow::Result<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(tickers.len());
    for t in tickers {
        let t = normalize_ticker(t)?;
        if seen.insert(t.clone()) {
            out.push(t);
        }
    }
    Ok(out)
}
