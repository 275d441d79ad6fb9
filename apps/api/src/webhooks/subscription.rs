use anyhow::anyhow;
use chrono::{DateTime, Months, Utc};
use uuid::Uuid;

use crate::billing::store::BillingStore;
use crate::errors::WebhookError;
use crate::models::subscription::{SubscriptionRow, SubscriptionUpsert, STATUS_ACTIVE};
use crate::webhooks::payload::WebhookPayload;

/// One calendar month from `start`. Day overflow is clamped by chrono
/// (Jan 31 -> Feb 28/29).
pub fn billing_period(
    start: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), WebhookError> {
    let end = start
        .checked_add_months(Months::new(1))
        .ok_or_else(|| anyhow!("billing period end for {start} is out of range"))?;
    Ok((start, end))
}

/// Brings the recruiter's subscription to "active for one month from `now`".
///
/// Replays of the same notification converge on the same single row; the
/// payload alone determines the new state.
pub async fn ensure_active_subscription(
    store: &dyn BillingStore,
    recruiter_id: Uuid,
    plan_id: &str,
    payload: &WebhookPayload,
    now: DateTime<Utc>,
) -> Result<SubscriptionRow, WebhookError> {
    let (current_period_start, current_period_end) = billing_period(now)?;
    let upsert = SubscriptionUpsert {
        recruiter_id,
        plan_id: plan_id.to_string(),
        status: STATUS_ACTIVE.to_string(),
        current_period_start,
        current_period_end,
        gateway_token: payload.token.clone().filter(|t| !t.trim().is_empty()),
        // m_payment_id is the merchant reference, stable across recurring charges
        gateway_subscription_id: payload.m_payment_id.clone().filter(|t| !t.trim().is_empty()),
    };
    Ok(store.upsert_subscription(&upsert).await?)
}
