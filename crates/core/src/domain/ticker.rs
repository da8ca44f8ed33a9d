use crate::error::AnalysisError;
use std::collections::BTreeSet;

const MAX_TICKER_LEN: usize = 15;
const MAX_BATCH_LEN: usize = 100;

/// Trims and upper-cases a ticker symbol, rejecting empty or malformed input.
pub fn normalize_ticker(raw: &str) -> Result<String, AnalysisError> {
    let ticker = raw.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(AnalysisError::InvalidInput("ticker must be non-empty".into()));
    }
    if ticker.len() > MAX_TICKER_LEN {
        return Err(AnalysisError::InvalidInput(format!(
            "ticker too long: {ticker}"
        )));
    }
    // Yahoo symbols: BRK-B, SAP.DE, ^GSPC, EURUSD=X
    let valid = ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if !valid {
        return Err(AnalysisError::InvalidInput(format!(
            "ticker contains invalid characters: {ticker}"
        )));
    }
    // "." and ".." would turn into path segments of the chart URL.
    if ticker.chars().all(|c| c == '.') {
        return Err(AnalysisError::InvalidInput(format!(
            "ticker must contain a symbol: {ticker}"
        )));
    }
    Ok(ticker)
}

/// Normalizes a caller-supplied list, dropping duplicates while keeping the
/// first occurrence's position.
pub fn normalize_tickers<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, AnalysisError> {
    if raw.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "ticker list must be non-empty".into(),
        ));
    }
    if raw.len() > MAX_BATCH_LEN {
        return Err(AnalysisError::InvalidInput(format!(
            "ticker list must have at most {MAX_BATCH_LEN} entries (got {})",
            raw.len()
        )));
    }

    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(raw.len());
    for t in raw {
        let ticker = normalize_ticker(t.as_ref())?;
        if seen.insert(ticker.clone()) {
            out.push(ticker);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_and_trims() {
        assert_eq!(normalize_ticker("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_ticker("sap.de").unwrap(), "SAP.DE");
        assert_eq!(normalize_ticker("brk-b").unwrap(), "BRK-B");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(normalize_ticker("   ").is_err());
        assert!(normalize_ticker("AA PL").is_err());
        assert!(normalize_ticker("../etc").is_err());
        assert!(normalize_ticker("ABCDEFGHIJKLMNOPQ").is_err());
    }

    #[test]
    fn rejects_dot_only_symbols() {
        assert!(normalize_ticker(".").is_err());
        assert!(normalize_ticker(" .. ").is_err());
        assert!(normalize_tickers(&["AAPL", "..."]).is_err());
        assert_eq!(normalize_ticker("BF.B").unwrap(), "BF.B");
    }

    #[test]
    fn list_dedupes_in_order() {
        let out = normalize_tickers(&["msft", "AAPL", "MSFT", "nvda"]).unwrap();
        assert_eq!(out, vec!["MSFT", "AAPL", "NVDA"]);
    }

    #[test]
    fn empty_list_is_invalid_input() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            normalize_tickers(&empty),
            Err(AnalysisError::InvalidInput(_))
        ));
    }
}
