use serde_json::{Map, Value};

use crate::errors::WebhookError;

/// Gateway value for a settled payment. Compared exactly.
pub const STATUS_COMPLETE: &str = "COMPLETE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Complete,
    Pending,
    Failed,
    Cancelled,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            STATUS_COMPLETE => PaymentStatus::Complete,
            "PENDING" => PaymentStatus::Pending,
            "FAILED" => PaymentStatus::Failed,
            "CANCELLED" => PaymentStatus::Cancelled,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Complete => STATUS_COMPLETE,
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Other(s) => s.as_str(),
        }
    }
}

/// A PayFast ITN (instant transaction notification) body.
///
/// Only whitelisted keys are lifted into typed fields. Scalars are kept in the
/// textual form the gateway signed; the untouched object is kept in `raw` for
/// the audit log.
#[derive(Debug, Clone, Default)]
pub struct WebhookPayload {
    pub m_payment_id: Option<String>,
    pub pf_payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub item_name: Option<String>,
    pub item_description: Option<String>,
    pub amount_gross: Option<String>,
    pub amount_fee: Option<String>,
    pub amount_net: Option<String>,
    pub custom_str: [Option<String>; 5],
    pub custom_int: [Option<String>; 5],
    pub name_first: Option<String>,
    pub name_last: Option<String>,
    pub email_address: Option<String>,
    pub merchant_id: Option<String>,
    pub token: Option<String>,
    pub signature: Option<String>,
    pub raw: Value,
}

impl WebhookPayload {
    /// Parses a raw request body. Anything other than a JSON object whose
    /// whitelisted keys hold scalars is rejected as malformed.
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        let raw: Value = serde_json::from_slice(body)
            .map_err(|e| WebhookError::Malformed(format!("invalid JSON: {e}")))?;
        Self::from_value(raw)
    }

    pub fn from_value(raw: Value) -> Result<Self, WebhookError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| WebhookError::Malformed("body must be a JSON object".to_string()))?;

        let field = |key: &str| scalar_field(obj, key);
        let numbered = |prefix: &str| -> Result<[Option<String>; 5], WebhookError> {
            Ok([
                field(&format!("{prefix}1"))?,
                field(&format!("{prefix}2"))?,
                field(&format!("{prefix}3"))?,
                field(&format!("{prefix}4"))?,
                field(&format!("{prefix}5"))?,
            ])
        };

        Ok(WebhookPayload {
            m_payment_id: field("m_payment_id")?,
            pf_payment_id: field("pf_payment_id")?,
            payment_status: field("payment_status")?,
            item_name: field("item_name")?,
            item_description: field("item_description")?,
            amount_gross: field("amount_gross")?,
            amount_fee: field("amount_fee")?,
            amount_net: field("amount_net")?,
            custom_str: numbered("custom_str")?,
            custom_int: numbered("custom_int")?,
            name_first: field("name_first")?,
            name_last: field("name_last")?,
            email_address: field("email_address")?,
            merchant_id: field("merchant_id")?,
            token: field("token")?,
            signature: field("signature")?,
            raw,
        })
    }

    /// Value of a whitelisted signature field by its gateway name.
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "m_payment_id" => &self.m_payment_id,
            "pf_payment_id" => &self.pf_payment_id,
            "payment_status" => &self.payment_status,
            "item_name" => &self.item_name,
            "item_description" => &self.item_description,
            "amount_gross" => &self.amount_gross,
            "amount_fee" => &self.amount_fee,
            "amount_net" => &self.amount_net,
            "custom_str1" => &self.custom_str[0],
            "custom_str2" => &self.custom_str[1],
            "custom_str3" => &self.custom_str[2],
            "custom_str4" => &self.custom_str[3],
            "custom_str5" => &self.custom_str[4],
            "custom_int1" => &self.custom_int[0],
            "custom_int2" => &self.custom_int[1],
            "custom_int3" => &self.custom_int[2],
            "custom_int4" => &self.custom_int[3],
            "custom_int5" => &self.custom_int[4],
            "name_first" => &self.name_first,
            "name_last" => &self.name_last,
            "email_address" => &self.email_address,
            "merchant_id" => &self.merchant_id,
            _ => return None,
        };
        value.as_deref()
    }

    pub fn status(&self) -> PaymentStatus {
        PaymentStatus::parse(self.payment_status.as_deref().unwrap_or_default())
    }

    /// Auth-system user id of the paying recruiter (`custom_str1`).
    pub fn user_id(&self) -> Option<&str> {
        non_blank(&self.custom_str[0])
    }

    /// Merchant-defined product identifier (`custom_str2`).
    pub fn product_id(&self) -> Option<&str> {
        non_blank(&self.custom_str[1])
    }

    /// Credit quantity for credit purchases (`custom_int1`), unparsed.
    pub fn credit_amount(&self) -> Option<&str> {
        non_blank(&self.custom_int[0])
    }

    /// Gateway id used in logs and the audit trail.
    pub fn payment_reference(&self) -> Option<&str> {
        non_blank(&self.pf_payment_id).or_else(|| non_blank(&self.m_payment_id))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn scalar_field(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, WebhookError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        // literal token text (serde_json `arbitrary_precision`)
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(WebhookError::Malformed(format!(
            "field '{key}' must be a string or number"
        ))),
    }
}
