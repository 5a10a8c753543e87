//! L10n Error Types
//!
//! 애플리케이션 전역 에러 타입과 HTTP 응답 변환

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// L10n 애플리케이션 에러
#[derive(Error, Debug)]
pub enum L10nError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Translation not found: {0}")]
    TranslationNotFound(i64),

    #[error("Language not found: {0}")]
    LanguageNotFound(String),

    #[error("Key already exists: {0}")]
    KeyAlreadyExists(String),

    #[error("{0}")]
    Validation(String),

    #[error("Import failed at key '{key}': {source}")]
    ImportFailed {
        key: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Failed to acquire database lock: {0}")]
    Lock(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

pub type L10nResult<T> = Result<T, L10nError>;

/// HTTP 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: String,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<L10nError> for ApiError {
    fn from(error: L10nError) -> Self {
        let (status, code) = match &error {
            L10nError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DB_ERROR"),
            L10nError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            L10nError::Serialization(_) => (StatusCode::BAD_REQUEST, "SERIALIZATION_ERROR"),
            L10nError::TranslationNotFound(_) => (StatusCode::NOT_FOUND, "TRANSLATION_NOT_FOUND"),
            L10nError::LanguageNotFound(_) => (StatusCode::NOT_FOUND, "LANGUAGE_NOT_FOUND"),
            L10nError::KeyAlreadyExists(_) => (StatusCode::CONFLICT, "KEY_ALREADY_EXISTS"),
            L10nError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            L10nError::ImportFailed { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "IMPORT_FAILED"),
            L10nError::Lock(_) => (StatusCode::INTERNAL_SERVER_ERROR, "LOCK_ERROR"),
            L10nError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TASK_ERROR"),
        };

        if status.is_server_error() {
            tracing::error!(code, error = %error, "request failed");
        }

        let details = match &error {
            L10nError::ImportFailed { key, .. } => Some(format!("key: {}", key)),
            _ => None,
        };

        ApiError {
            status,
            code: code.to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// 라우트 핸들러 결과 타입
pub type ApiResult<T> = Result<T, ApiError>;
