//! API error type mapped onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// The database is missing or locked, typically before the first
    /// pipeline run has loaded it
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> ApiError {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("row not found".into()),
            sqlx::Error::Database(db) => ApiError::Unavailable(db.to_string()),
            sqlx::Error::Io(io) => ApiError::Unavailable(io.to_string()),
            sqlx::Error::PoolTimedOut => ApiError::Unavailable("connection pool timed out".into()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<migra_common::Error> for ApiError {
    fn from(e: migra_common::Error) -> ApiError {
        match e {
            migra_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            migra_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            migra_common::Error::Database(db) => db.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
