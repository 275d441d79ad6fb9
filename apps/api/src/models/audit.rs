#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Write-once record of what the gateway sent and how it was handled.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentAuditLogRow {
    pub id: Uuid,
    pub gateway_payment_id: Option<String>,
    pub payment_status: String,
    pub recruiter_id: Option<Uuid>,
    pub outcome: String,
    pub raw_payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub gateway_payment_id: Option<String>,
    pub payment_status: String,
    pub recruiter_id: Option<Uuid>,
    pub outcome: String,
    pub raw_payload: Value,
}
