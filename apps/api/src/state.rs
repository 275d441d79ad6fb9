use std::sync::Arc;

use crate::billing::store::BillingStore;
use crate::webhooks::processor::WebhookSettings;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Billing data layer. Postgres in production, in-memory in tests.
    pub store: Arc<dyn BillingStore>,
    /// Signature verifier (with the configured passphrase) and merchant check.
    pub webhooks: WebhookSettings,
}
