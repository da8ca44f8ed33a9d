use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stockscore_core::error::{AnalysisError, ProviderError};

#[derive(Debug)]
pub enum ApiError {
    Analysis(AnalysisError),
    BadRequest(String),
    NotFound(String),
    Upstream { ticker: String, error: ProviderError },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticker: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Analysis(AnalysisError::InvalidInput(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Analysis(AnalysisError::NotFound { .. }) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Analysis(AnalysisError::InsufficientHistory { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Analysis(AnalysisError::UpstreamUnavailable { .. }) | ApiError::Upstream { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        ApiError::Analysis(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, ticker) = match &self {
            ApiError::Analysis(err) => {
                if status.is_server_error() {
                    sentry::capture_error(err);
                }
                (err.to_string(), err.ticker().map(str::to_string))
            }
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => (msg.clone(), None),
            ApiError::Upstream { ticker, error } => {
                sentry::capture_error(error);
                (error.to_string(), Some(ticker.clone()))
            }
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %error, ticker = ticker.as_deref().unwrap_or("-"), "request failed");
        }

        (
            status,
            Json(ErrorBody {
                success: false,
                error,
                ticker,
            }),
        )
            .into_response()
    }
}
