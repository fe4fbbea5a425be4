use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::jobs::db::is_unique_violation;
use crate::jobs::types::FieldError;
use crate::scrape::error::ScrapeError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Job not found")]
    NotFound,

    #[error("Invalid ID format")]
    InvalidId,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error")]
    Validation(Vec<FieldError>),

    #[error("A job with the same title, company and posting date already exists")]
    Conflict,

    #[error("Scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<PathRejection> for ApiError {
    fn from(_: PathRejection) -> Self {
        ApiError::InvalidId
    }
}

// Malformed or mistyped bodies report through the same contract as field validation.
impl From<JsonRejection> for ApiError {
    fn from(rej: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("body", rej.body_text())])
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rej: QueryRejection) -> Self {
        ApiError::Validation(vec![FieldError::new("query", rej.body_text())])
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) { ApiError::Conflict } else { ApiError::Database(err) }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::InvalidId => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Scrape(ScrapeError::InvalidPageCount) => StatusCode::BAD_REQUEST,
            ApiError::Scrape(ScrapeError::ExtractionTimeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Scrape(ScrapeError::NavigationFailure { .. } | ScrapeError::ContentMissing { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Scrape(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let message = self.to_string();
        let body = match self {
            ApiError::Validation(details) => ErrorBody { message, details: Some(details), count: None },
            ApiError::Scrape(e) => ErrorBody { message, details: None, count: Some(e.processed()) },
            ApiError::Database(_) => ErrorBody { message: "Internal Server Error".into(), details: None, count: None },
            _ => ErrorBody { message, details: None, count: None },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Validation(vec![]).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidId.status(), StatusCode::BAD_REQUEST);
        let timeout = ScrapeError::ExtractionTimeout { page: 1, selector: "div".into(), waited: Duration::from_secs(15) };
        assert_eq!(ApiError::from(timeout).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ApiError::from(sqlx::Error::RowNotFound).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
