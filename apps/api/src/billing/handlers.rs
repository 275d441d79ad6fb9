use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::subscription::SubscriptionRow;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct BillingSummary {
    pub recruiter_id: Uuid,
    pub subscription: Option<SubscriptionRow>,
    pub is_premium: bool,
    pub credit_balance: i64,
}

/// GET /api/v1/billing
pub async fn handle_get_billing(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<BillingSummary>, AppError> {
    let user_id = params.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id must not be empty".to_string()));
    }

    let recruiter = state
        .store
        .find_recruiter_by_user_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No recruiter for user {user_id}")))?;

    let subscription = state.store.get_subscription(recruiter.id).await?;
    let credit_balance = state.store.get_credit_balance(recruiter.id).await?;
    let is_premium = subscription
        .as_ref()
        .is_some_and(|s| s.is_active_at(Utc::now()));

    Ok(Json(BillingSummary {
        recruiter_id: recruiter.id,
        subscription,
        is_premium,
        credit_balance,
    }))
}
