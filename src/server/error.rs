use crate::leaderboard::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("invalid request body: {0}")]
    MalformedBody(String),
    #[error("Language not found")]
    LanguageNotFound(String),
    #[error("Score not found")]
    ScoreNotFound(u64),
    /// The path segment was not a score id at all
    #[error("Score not found")]
    InvalidScoreId(String),
    /// Backing-medium failure; `language` is set for leaderboard reads so the
    /// body still carries an empty listing.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
        language: Option<String>,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Sort a store error into client mistakes and backend faults.
    pub fn from_store(context: &'static str, err: StoreError, language: Option<String>) -> Self {
        match err {
            StoreError::Validation { field, message } => ApiError::Validation { field, message },
            StoreError::NotFound(id) => ApiError::ScoreNotFound(id),
            source => ApiError::Store {
                context,
                source,
                language,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::LanguageNotFound(_)
            | ApiError::ScoreNotFound(_)
            | ApiError::InvalidScoreId(_) => StatusCode::NOT_FOUND,
            ApiError::Store { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { field, message } => json!({ "error": message, "field": field }),
            ApiError::MalformedBody(message) => {
                json!({ "error": "Invalid request body", "message": message })
            }
            ApiError::LanguageNotFound(language) => {
                json!({ "error": "Language not found", "requested": language })
            }
            ApiError::ScoreNotFound(_) => json!({ "error": "Score not found" }),
            ApiError::InvalidScoreId(requested) => {
                json!({ "error": "Score not found", "requested": requested })
            }
            ApiError::Store {
                context,
                source,
                language,
            } => {
                tracing::error!(error = %source, "{context}");
                match language {
                    Some(language) => json!({
                        "error": context,
                        "message": source.to_string(),
                        "scores": [],
                        "language": language,
                        "total": 0,
                    }),
                    None => json!({ "error": context, "message": source.to_string() }),
                }
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "internal error");
                json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
