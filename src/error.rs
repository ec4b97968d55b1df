use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Too many requests. Please try again later.")]
    RateLimited,

    #[error("Idea not found")]
    NotFound,

    // `message` is what the client sees, `source` only reaches the logs
    #[error("{message}")]
    Internal {
        message: &'static str,
        #[source]
        source: StoreError,
    },
}

impl AppError {
    /// Translate a store failure, keeping `NotFound` distinct from everything else.
    pub fn from_store(source: StoreError, message: &'static str) -> Self {
        match source {
            StoreError::NotFound => AppError::NotFound,
            source => AppError::Internal { message, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal { message, source } = &self {
            error!(error = %source, "{message}");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            success: false,
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err = AppError::from_store(StoreError::NotFound, "Failed to upvote idea");
        assert!(matches!(err, AppError::NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Idea not found");
    }

    #[test]
    fn internal_errors_hide_the_source() {
        let err = AppError::from_store(
            StoreError::Database(sqlx::Error::PoolTimedOut),
            "Failed to create idea",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Failed to create idea");
    }

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            AppError::Validation("Idea cannot be empty".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
