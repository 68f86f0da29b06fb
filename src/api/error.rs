//! API error types

use thiserror::Error;

/// Errors that can occur when fetching market data
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("API returned error: {code} - {message}")]
    ApiResponseError { code: i32, message: String },

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("invalid data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
