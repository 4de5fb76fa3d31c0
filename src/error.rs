use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A database error.
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// A connection pool error.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A validation error (missing or malformed request fields).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A duplicate registration.
    #[error("Account already exists")]
    AlreadyExists,

    /// A credential check failure (bad email or password).
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A missing, malformed, unverifiable, or expired bearer token.
    #[error("Unauthorized")]
    Unauthorized,

    /// An encryption error.
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// An authenticated-decryption failure: tag mismatch, malformed
    /// nonce/ciphertext, or wrong key. Never carries partial plaintext.
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// A resource not found error.
    #[error("Resource not found")]
    NotFound,

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Pool(ref e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }

            AppError::Validation(ref msg) => {
                tracing::debug!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }

            AppError::AlreadyExists => {
                tracing::debug!("Duplicate registration rejected");
                (StatusCode::BAD_REQUEST, "Account already exists".to_string())
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }

            AppError::Unauthorized => {
                tracing::warn!("Unauthorized request");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }

            AppError::Encryption(ref msg) => {
                tracing::error!("Encryption error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Encryption error".to_string())
            }

            AppError::Decrypt(ref msg) => {
                // Surfaced, never silently mapped to an empty result: a
                // failing tariff blob means corruption or a key mismatch.
                tracing::error!("Decryption failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored data failed authentication".to_string(),
                )
            }

            AppError::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "error": message
        }))
        .unwrap_or_else(|_| r#"{"error":"Internal server error"}"#.to_string());

        (status, body).into_response()
    }
}
