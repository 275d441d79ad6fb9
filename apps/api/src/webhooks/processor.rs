//! The PayFast notification pipeline.
//!
//! ```text
//! body -> parse -> verify signature -> merchant check -> classify
//!                        |                  |              |
//!                       400                400      ignore (200) / 400
//!                                                          |
//!                                    resolve recruiter -> subscription | credits
//!                                                          |
//!                                                   audit (always) -> 200 / 400 / 500
//! ```
//!
//! No step holds state between requests; concurrent deliveries are safe
//! because each store call is a single atomic statement.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::billing::store::BillingStore;
use crate::errors::WebhookError;
use crate::models::recruiter::RecruiterRow;
use crate::webhooks::audit::{record_payment_event, OUTCOME_PROCESSED};
use crate::webhooks::classifier::{classify, BillingChange, PaymentAction};
use crate::webhooks::credits::add_purchased_credits;
use crate::webhooks::payload::{PaymentStatus, WebhookPayload};
use crate::webhooks::signature::SignatureVerifier;
use crate::webhooks::subscription::ensure_active_subscription;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Ignored {
        status: PaymentStatus,
    },
    SubscriptionActivated {
        recruiter_id: Uuid,
        period_end: DateTime<Utc>,
    },
    CreditsAdded {
        recruiter_id: Uuid,
        amount: i64,
        balance: i64,
    },
}

impl WebhookOutcome {
    /// Plain-text acknowledgement body.
    pub fn message(&self) -> String {
        match self {
            WebhookOutcome::Ignored { status } => {
                format!("Ignored: payment status {}", status.as_str())
            }
            WebhookOutcome::SubscriptionActivated { period_end, .. } => {
                format!("Subscription active until {}", period_end.to_rfc3339())
            }
            WebhookOutcome::CreditsAdded { amount, .. } => format!("Added {amount} credits"),
        }
    }
}

/// Settings the pipeline needs besides the store.
#[derive(Debug, Clone, Default)]
pub struct WebhookSettings {
    pub verifier: SignatureVerifier,
    pub merchant_id: Option<String>,
}

pub async fn process_notification(
    store: &dyn BillingStore,
    settings: &WebhookSettings,
    body: &[u8],
    now: DateTime<Utc>,
) -> Result<WebhookOutcome, WebhookError> {
    let payload = WebhookPayload::from_slice(body)?;

    if !settings.verifier.verify(&payload) {
        warn!(
            "Rejected PayFast notification {:?}: signature mismatch",
            payload.payment_reference()
        );
        return Err(WebhookError::InvalidSignature);
    }

    if let Some(expected) = settings.merchant_id.as_deref() {
        if payload.merchant_id.as_deref().map(str::trim) != Some(expected) {
            warn!(
                "Rejected PayFast notification {:?}: merchant id {:?} does not match",
                payload.payment_reference(),
                payload.merchant_id
            );
            return Err(WebhookError::MerchantMismatch);
        }
    }

    let (user_id, change) = match classify(&payload)? {
        PaymentAction::Ignore { status } => {
            info!(
                "Ignoring PayFast notification {:?} with status {}",
                payload.payment_reference(),
                status.as_str()
            );
            return Ok(WebhookOutcome::Ignored { status });
        }
        PaymentAction::Apply { user_id, change } => (user_id, change),
    };

    let (recruiter_id, result) = reconcile(store, &user_id, &change, &payload, now).await;

    let outcome = match &result {
        Ok(_) => OUTCOME_PROCESSED.to_string(),
        Err(e) => format!("failed: {e}"),
    };
    record_payment_event(store, &payload, recruiter_id, outcome).await;

    if let Ok(done) = &result {
        info!(
            "Processed PayFast notification {:?} for recruiter {:?}: {}",
            payload.payment_reference(),
            recruiter_id,
            done.message()
        );
    }
    result
}

/// Applies a billing change. Returns the recruiter id whenever it was
/// resolved so the audit entry can carry it even on failure.
async fn reconcile(
    store: &dyn BillingStore,
    user_id: &str,
    change: &BillingChange,
    payload: &WebhookPayload,
    now: DateTime<Utc>,
) -> (Option<Uuid>, Result<WebhookOutcome, WebhookError>) {
    let recruiter = match resolve_recruiter(store, user_id).await {
        Ok(r) => r,
        Err(e) => return (None, Err(e)),
    };

    let result = match change {
        BillingChange::ActivateSubscription { plan_id } => {
            ensure_active_subscription(store, recruiter.id, plan_id, payload, now)
                .await
                .map(|sub| WebhookOutcome::SubscriptionActivated {
                    recruiter_id: recruiter.id,
                    period_end: sub.current_period_end,
                })
        }
        BillingChange::AddCredits { amount } => {
            add_purchased_credits(store, recruiter.id, *amount)
                .await
                .map(|balance| WebhookOutcome::CreditsAdded {
                    recruiter_id: recruiter.id,
                    amount: *amount,
                    balance,
                })
        }
    };
    (Some(recruiter.id), result)
}

/// A missing recruiter is an upstream data problem; it is never created here.
async fn resolve_recruiter(
    store: &dyn BillingStore,
    user_id: &str,
) -> Result<RecruiterRow, WebhookError> {
    store
        .find_recruiter_by_user_id(user_id)
        .await?
        .ok_or_else(|| WebhookError::RecruiterNotFound(user_id.to_string()))
}
