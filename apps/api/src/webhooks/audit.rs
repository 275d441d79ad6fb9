use tracing::error;
use uuid::Uuid;

use crate::billing::store::BillingStore;
use crate::models::audit::NewAuditEntry;
use crate::webhooks::payload::WebhookPayload;

pub const OUTCOME_PROCESSED: &str = "processed";

/// Appends the raw notification and its outcome to the payment audit log.
///
/// Failures are logged and swallowed: the response to the gateway reflects
/// the reconciliation result only.
pub async fn record_payment_event(
    store: &dyn BillingStore,
    payload: &WebhookPayload,
    recruiter_id: Option<Uuid>,
    outcome: String,
) {
    let entry = NewAuditEntry {
        gateway_payment_id: payload.payment_reference().map(str::to_string),
        payment_status: payload.status().as_str().to_string(),
        recruiter_id,
        outcome,
        raw_payload: payload.raw.clone(),
    };
    if let Err(e) = store.append_audit_entry(&entry).await {
        error!(
            "Failed to write audit entry for payment {:?}: {e:#}",
            entry.gateway_payment_id
        );
    }
}
