use axum::{extract::State, http::StatusCode};
use bytes::Bytes;
use chrono::Utc;

use crate::errors::WebhookError;
use crate::state::AppState;
use crate::webhooks::processor::process_notification;

/// POST /api/v1/webhooks/payfast
///
/// Takes the raw body so the signature is checked against exactly what was sent.
pub async fn handle_payfast_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, String), WebhookError> {
    let outcome =
        process_notification(state.store.as_ref(), &state.webhooks, &body, Utc::now()).await?;
    Ok((StatusCode::OK, outcome.message()))
}
