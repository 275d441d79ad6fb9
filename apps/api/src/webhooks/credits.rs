use uuid::Uuid;

use crate::billing::store::BillingStore;
use crate::errors::WebhookError;

/// Adds purchased job-posting credits in one atomic store call and returns
/// the resulting balance. Non-positive amounts are refused outright.
pub async fn add_purchased_credits(
    store: &dyn BillingStore,
    recruiter_id: Uuid,
    amount: i64,
) -> Result<i64, WebhookError> {
    if amount <= 0 {
        return Err(WebhookError::InvalidCreditAmount(amount.to_string()));
    }
    Ok(store.add_credits(recruiter_id, amount).await?)
}
