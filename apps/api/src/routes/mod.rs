pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::billing::handlers as billing;
use crate::state::AppState;
use crate::webhooks::handlers as webhooks;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Payment gateway callbacks
        .route(
            "/api/v1/webhooks/payfast",
            post(webhooks::handle_payfast_webhook),
        )
        // Billing read API
        .route("/api/v1/billing", get(billing::handle_get_billing))
        .with_state(state)
}
