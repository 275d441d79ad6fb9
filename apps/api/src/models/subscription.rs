use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_ACTIVE: &str = "active";
pub const PLAN_PREMIUM: &str = "premium";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub recruiter_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub gateway_token: Option<String>,
    pub gateway_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == STATUS_ACTIVE && now < self.current_period_end
    }
}

/// Full target state of a recruiter's subscription row. Applying the same value
/// twice yields the same row.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionUpsert {
    pub recruiter_id: Uuid,
    pub plan_id: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub gateway_token: Option<String>,
    pub gateway_subscription_id: Option<String>,
}
