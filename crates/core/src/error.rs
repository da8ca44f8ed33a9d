use thiserror::Error;

/// Failure reported by an upstream collaborator (market data or news).
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("provider HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

/// Per-ticker analysis failure. Batch operations drop these; single-ticker
/// requests surface them to the caller.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ticker {ticker} not found")]
    NotFound { ticker: String },

    #[error("upstream unavailable for {ticker}: {reason}")]
    UpstreamUnavailable { ticker: String, reason: String },

    #[error("insufficient history for {ticker}: {samples} samples")]
    InsufficientHistory { ticker: String, samples: usize },
}

impl AnalysisError {
    pub fn from_provider(ticker: &str, err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(_) => Self::NotFound {
                ticker: ticker.to_string(),
            },
            other => Self::UpstreamUnavailable {
                ticker: ticker.to_string(),
                reason: other.to_string(),
            },
        }
    }

    pub fn ticker(&self) -> Option<&str> {
        match self {
            Self::InvalidInput(_) => None,
            Self::NotFound { ticker }
            | Self::UpstreamUnavailable { ticker, .. }
            | Self::InsufficientHistory { ticker, .. } => Some(ticker.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_not_found_maps_to_not_found() {
        let err = AnalysisError::from_provider("ZZZZ", ProviderError::NotFound("ZZZZ".into()));
        assert!(matches!(err, AnalysisError::NotFound { ref ticker } if ticker == "ZZZZ"));
    }

    #[test]
    fn other_provider_errors_are_upstream_unavailable() {
        let err = AnalysisError::from_provider(
            "AAPL",
            ProviderError::Http {
                status: 503,
                body: "busy".into(),
            },
        );
        match err {
            AnalysisError::UpstreamUnavailable { ticker, reason } => {
                assert_eq!(ticker, "AAPL");
                assert!(reason.contains("503"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
