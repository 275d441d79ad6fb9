use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type for the JSON API routes.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Failures of the payment webhook pipeline.
///
/// The gateway only reads the status code and retries on anything non-2xx, so
/// the body is plain text. Everything except `Store` is a permanent rejection.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Merchant id mismatch")]
    MerchantMismatch,

    #[error("Missing correlation field: {0}")]
    MissingCorrelation(&'static str),

    #[error("Unknown product identifier: {0}")]
    UnknownProduct(String),

    #[error("Invalid credit amount: {0}")]
    InvalidCreditAmount(String),

    #[error("No recruiter found for user {0}")]
    RecruiterNotFound(String),

    #[error("{0}")]
    Store(#[from] anyhow::Error),
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Webhook processing failed: {self}");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
