//! Custom error types for the feed service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{error::DataSourceError, pagination::ValidationError};
use thiserror::Error;
use tracing::error;

use crate::models::{Envelope, code};

/// Custom error type for the feed service
///
/// Every variant renders as the failure envelope, with the HTTP status
/// mirroring the envelope code.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or missing request parameter
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No current user could be established
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
}

impl ApiError {
    pub fn code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => code::VALIDATION,
            ApiError::Unauthorized => code::UNAUTHORIZED,
            ApiError::NotFound(_) => code::NOT_FOUND,
            ApiError::DataSource(_) => code::DATA_SOURCE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            ApiError::DataSource(e) => {
                error!("Request failed: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(Envelope::failure(code, message))).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
