//! Data-layer seam for billing state.
//!
//! `AppState` holds an `Arc<dyn BillingStore>`. Production uses `PgBillingStore`;
//! tests use the in-memory store in `billing::memory`.
//!
//! Every mutating operation is a single statement so that concurrent webhook
//! deliveries need no application-level locking:
//! - subscriptions converge through `INSERT .. ON CONFLICT (recruiter_id) DO UPDATE`
//! - credits are added with one `INSERT .. ON CONFLICT DO UPDATE SET balance = balance + n`
//! - audit entries are plain appends

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::audit::NewAuditEntry;
use crate::models::recruiter::RecruiterRow;
use crate::models::subscription::{SubscriptionRow, SubscriptionUpsert};

#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Looks up a recruiter by the auth-system user id that owns it.
    async fn find_recruiter_by_user_id(&self, user_id: &str) -> Result<Option<RecruiterRow>>;

    /// Creates or replaces the single subscription row for `upsert.recruiter_id`.
    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<SubscriptionRow>;

    /// Atomically adds `amount` credits and returns the new balance.
    async fn add_credits(&self, recruiter_id: Uuid, amount: i64) -> Result<i64>;

    async fn append_audit_entry(&self, entry: &NewAuditEntry) -> Result<()>;

    async fn get_subscription(&self, recruiter_id: Uuid) -> Result<Option<SubscriptionRow>>;

    /// Returns 0 for recruiters that never purchased credits.
    async fn get_credit_balance(&self, recruiter_id: Uuid) -> Result<i64>;
}

pub struct PgBillingStore {
    pool: PgPool,
}

impl PgBillingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BillingStore for PgBillingStore {
    async fn find_recruiter_by_user_id(&self, user_id: &str) -> Result<Option<RecruiterRow>> {
        let recruiter = sqlx::query_as::<_, RecruiterRow>(
            "SELECT * FROM recruiters WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to look up recruiter")?;
        Ok(recruiter)
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions
                (recruiter_id, plan_id, status, current_period_start, current_period_end,
                 gateway_token, gateway_subscription_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (recruiter_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                current_period_start = EXCLUDED.current_period_start,
                current_period_end = EXCLUDED.current_period_end,
                gateway_token = EXCLUDED.gateway_token,
                gateway_subscription_id = EXCLUDED.gateway_subscription_id,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(upsert.recruiter_id)
        .bind(&upsert.plan_id)
        .bind(&upsert.status)
        .bind(upsert.current_period_start)
        .bind(upsert.current_period_end)
        .bind(&upsert.gateway_token)
        .bind(&upsert.gateway_subscription_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to upsert subscription")?;

        debug!("Upserted subscription {} for recruiter {}", row.id, row.recruiter_id);
        Ok(row)
    }

    async fn add_credits(&self, recruiter_id: Uuid, amount: i64) -> Result<i64> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO recruiter_credits (recruiter_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (recruiter_id) DO UPDATE SET
                balance = recruiter_credits.balance + EXCLUDED.balance,
                updated_at = now()
            RETURNING balance
            "#,
        )
        .bind(recruiter_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await
        .context("Failed to increment credit balance")?;
        Ok(balance)
    }

    async fn append_audit_entry(&self, entry: &NewAuditEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_audit_logs
                (gateway_payment_id, payment_status, recruiter_id, outcome, raw_payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&entry.gateway_payment_id)
        .bind(&entry.payment_status)
        .bind(entry.recruiter_id)
        .bind(&entry.outcome)
        .bind(&entry.raw_payload)
        .execute(&self.pool)
        .await
        .context("Failed to write payment audit log")?;
        Ok(())
    }

    async fn get_subscription(&self, recruiter_id: Uuid) -> Result<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            "SELECT * FROM subscriptions WHERE recruiter_id = $1",
        )
        .bind(recruiter_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load subscription")?;
        Ok(row)
    }

    async fn get_credit_balance(&self, recruiter_id: Uuid) -> Result<i64> {
        let balance: Option<i64> =
            sqlx::query_scalar("SELECT balance FROM recruiter_credits WHERE recruiter_id = $1")
                .bind(recruiter_id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to load credit balance")?;
        Ok(balance.unwrap_or(0))
    }
}
