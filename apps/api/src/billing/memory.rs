//! In-process `BillingStore` for tests. One mutex guards all tables, so each
//! trait call is as atomic as the single SQL statement it stands in for.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::billing::store::BillingStore;
use crate::models::audit::{NewAuditEntry, PaymentAuditLogRow};
use crate::models::recruiter::RecruiterRow;
use crate::models::subscription::{SubscriptionRow, SubscriptionUpsert};

#[derive(Default)]
struct Tables {
    recruiters: Vec<RecruiterRow>,
    subscriptions: HashMap<Uuid, SubscriptionRow>,
    credits: HashMap<Uuid, i64>,
    audit_log: Vec<PaymentAuditLogRow>,
    writes: usize,
}

#[derive(Default)]
pub struct InMemoryBillingStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    fail_audit: AtomicBool,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_recruiter(&self, user_id: &str) -> RecruiterRow {
        let now = Utc::now();
        let row = RecruiterRow {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            company_name: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().recruiters.push(row.clone());
        row
    }

    /// Makes subscription and credit writes fail, as a dropped connection would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_audit(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    /// Number of successful mutating calls across all tables.
    pub fn write_count(&self) -> usize {
        self.tables.lock().unwrap().writes
    }

    pub fn subscription_count(&self, recruiter_id: Uuid) -> usize {
        self.tables
            .lock()
            .unwrap()
            .subscriptions
            .values()
            .filter(|s| s.recruiter_id == recruiter_id)
            .count()
    }

    pub fn audit_entries(&self) -> Vec<PaymentAuditLogRow> {
        self.tables.lock().unwrap().audit_log.clone()
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn find_recruiter_by_user_id(&self, user_id: &str) -> Result<Option<RecruiterRow>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .recruiters
            .iter()
            .find(|r| r.user_id == user_id)
            .cloned())
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<SubscriptionRow> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection closed while upserting subscription");
        }
        let now = Utc::now();
        let mut tables = self.tables.lock().unwrap();
        let (id, created_at) = tables
            .subscriptions
            .get(&upsert.recruiter_id)
            .map(|s| (s.id, s.created_at))
            .unwrap_or_else(|| (Uuid::new_v4(), now));
        let row = SubscriptionRow {
            id,
            recruiter_id: upsert.recruiter_id,
            plan_id: upsert.plan_id.clone(),
            status: upsert.status.clone(),
            current_period_start: upsert.current_period_start,
            current_period_end: upsert.current_period_end,
            gateway_token: upsert.gateway_token.clone(),
            gateway_subscription_id: upsert.gateway_subscription_id.clone(),
            created_at,
            updated_at: now,
        };
        tables.subscriptions.insert(upsert.recruiter_id, row.clone());
        tables.writes += 1;
        Ok(row)
    }

    async fn add_credits(&self, recruiter_id: Uuid, amount: i64) -> Result<i64> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("connection closed while adding credits");
        }
        let mut tables = self.tables.lock().unwrap();
        let balance = tables.credits.entry(recruiter_id).or_insert(0);
        let Some(updated) = balance.checked_add(amount).filter(|b| *b >= 0) else {
            bail!("bigint out of range while adding credits");
        };
        *balance = updated;
        let balance = updated;
        tables.writes += 1;
        Ok(balance)
    }

    async fn append_audit_entry(&self, entry: &NewAuditEntry) -> Result<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            bail!("audit table unavailable");
        }
        let mut tables = self.tables.lock().unwrap();
        tables.audit_log.push(PaymentAuditLogRow {
            id: Uuid::new_v4(),
            gateway_payment_id: entry.gateway_payment_id.clone(),
            payment_status: entry.payment_status.clone(),
            recruiter_id: entry.recruiter_id,
            outcome: entry.outcome.clone(),
            raw_payload: entry.raw_payload.clone(),
            created_at: Utc::now(),
        });
        tables.writes += 1;
        Ok(())
    }

    async fn get_subscription(&self, recruiter_id: Uuid) -> Result<Option<SubscriptionRow>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .subscriptions
            .get(&recruiter_id)
            .cloned())
    }

    async fn get_credit_balance(&self, recruiter_id: Uuid) -> Result<i64> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .credits
            .get(&recruiter_id)
            .copied()
            .unwrap_or(0))
    }
}
