use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The billing tenant. `user_id` is the auth provider's id for the owning account,
/// which is what the payment gateway round-trips in `custom_str1`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecruiterRow {
    pub id: Uuid,
    pub user_id: String,
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
