use crate::errors::WebhookError;
use crate::models::subscription::PLAN_PREMIUM;
use crate::webhooks::payload::{PaymentStatus, WebhookPayload};

const CREDITS_PREFIX: &str = "credits_";

/// Largest credit quantity a single purchase may carry.
pub const MAX_CREDIT_PURCHASE: i64 = 1_000_000;

/// What a verified notification asks the service to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentAction {
    /// Not a settled payment; acknowledged without touching state.
    Ignore { status: PaymentStatus },
    Apply { user_id: String, change: BillingChange },
}

/// State change for the recruiter identified by `custom_str1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingChange {
    ActivateSubscription { plan_id: String },
    /// `amount` comes from `custom_int1`, never from the product string.
    AddCredits { amount: i64 },
}

/// Decides the action for a payload that already passed signature checks.
///
/// Anything that is complete but cannot be mapped to a product, or whose
/// credit quantity is unusable, is rejected before any state is touched.
pub fn classify(payload: &WebhookPayload) -> Result<PaymentAction, WebhookError> {
    let status = payload.status();
    if status != PaymentStatus::Complete {
        return Ok(PaymentAction::Ignore { status });
    }

    let user_id = payload
        .user_id()
        .ok_or(WebhookError::MissingCorrelation("custom_str1"))?
        .to_string();
    let product_id = payload
        .product_id()
        .ok_or(WebhookError::MissingCorrelation("custom_str2"))?;

    let change = if product_id == PLAN_PREMIUM {
        BillingChange::ActivateSubscription {
            plan_id: PLAN_PREMIUM.to_string(),
        }
    } else if product_id.starts_with(CREDITS_PREFIX) {
        BillingChange::AddCredits {
            amount: parse_credit_amount(payload.credit_amount())?,
        }
    } else {
        return Err(WebhookError::UnknownProduct(product_id.to_string()));
    };

    Ok(PaymentAction::Apply { user_id, change })
}

/// Accepts a positive whole number, including integral decimals such as
/// `5.0`, up to [`MAX_CREDIT_PURCHASE`].
fn parse_credit_amount(raw: Option<&str>) -> Result<i64, WebhookError> {
    let raw = raw.ok_or_else(|| WebhookError::InvalidCreditAmount("missing".to_string()))?;
    let whole = match raw.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        Some(_) => return Err(WebhookError::InvalidCreditAmount(raw.to_string())),
        None => raw,
    };
    match whole.parse::<i64>() {
        Ok(n) if n > 0 && n <= MAX_CREDIT_PURCHASE => Ok(n),
        _ => Err(WebhookError::InvalidCreditAmount(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_json(value: serde_json::Value) -> Result<PaymentAction, WebhookError> {
        classify(&WebhookPayload::from_value(value).unwrap())
    }

    #[test]
    fn test_non_complete_is_ignored_even_without_correlation() {
        let action = classify_json(json!({"payment_status": "PENDING"})).unwrap();
        assert_eq!(
            action,
            PaymentAction::Ignore {
                status: PaymentStatus::Pending
            }
        );
    }

    #[test]
    fn test_lowercase_complete_is_ignored() {
        let action = classify_json(json!({
            "payment_status": "complete",
            "custom_str1": "user-42",
            "custom_str2": "premium",
        }))
        .unwrap();
        assert!(matches!(action, PaymentAction::Ignore { .. }));
    }

    #[test]
    fn test_premium_activates_subscription() {
        let action = classify_json(json!({
            "payment_status": "COMPLETE",
            "custom_str1": "user-42",
            "custom_str2": "premium",
        }))
        .unwrap();
        assert_eq!(
            action,
            PaymentAction::Apply {
                user_id: "user-42".to_string(),
                change: BillingChange::ActivateSubscription {
                    plan_id: "premium".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_credit_amount_comes_from_custom_int1() {
        let action = classify_json(json!({
            "payment_status": "COMPLETE",
            "custom_str1": "user-42",
            "custom_str2": "credits_10",
            "custom_int1": 5,
        }))
        .unwrap();
        assert_eq!(
            action,
            PaymentAction::Apply {
                user_id: "user-42".to_string(),
                change: BillingChange::AddCredits { amount: 5 },
            }
        );
    }

    fn credit_change(raw: &[u8]) -> Result<PaymentAction, WebhookError> {
        classify(&WebhookPayload::from_slice(raw).unwrap())
    }

    #[test]
    fn test_integral_decimal_credit_amount_is_accepted() {
        let action = credit_change(
            br#"{"payment_status":"COMPLETE","custom_str1":"user-42",
                "custom_str2":"credits_5","custom_int1":5.0}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            PaymentAction::Apply {
                user_id: "user-42".to_string(),
                change: BillingChange::AddCredits { amount: 5 },
            }
        );
    }

    #[test]
    fn test_credit_amount_above_cap_is_rejected() {
        let over = (MAX_CREDIT_PURCHASE + 1).to_string();
        let huge = i64::MAX.to_string();
        for amount in [over.as_str(), huge.as_str(), "99999999999999999999"] {
            let err = classify_json(json!({
                "payment_status": "COMPLETE",
                "custom_str1": "user-42",
                "custom_str2": "credits_10",
                "custom_int1": amount,
            }))
            .unwrap_err();
            assert!(matches!(err, WebhookError::InvalidCreditAmount(_)), "{amount}");
        }

        let at_cap = classify_json(json!({
            "payment_status": "COMPLETE",
            "custom_str1": "user-42",
            "custom_str2": "credits_10",
            "custom_int1": MAX_CREDIT_PURCHASE,
        }))
        .unwrap();
        assert!(matches!(
            at_cap,
            PaymentAction::Apply {
                change: BillingChange::AddCredits { amount: MAX_CREDIT_PURCHASE },
                ..
            }
        ));
    }

    #[test]
    fn test_bad_credit_amounts_are_rejected() {
        for amount in [json!(0), json!(-3), json!("five"), json!("2.5"), json!("5."), json!(null)] {
            let err = classify_json(json!({
                "payment_status": "COMPLETE",
                "custom_str1": "user-42",
                "custom_str2": "credits_10",
                "custom_int1": amount,
            }))
            .unwrap_err();
            assert!(
                matches!(err, WebhookError::InvalidCreditAmount(_)),
                "amount {amount} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_missing_user_id_is_rejected() {
        let err = classify_json(json!({
            "payment_status": "COMPLETE",
            "custom_str2": "premium",
        }))
        .unwrap_err();
        assert!(matches!(err, WebhookError::MissingCorrelation("custom_str1")));
    }

    #[test]
    fn test_unknown_product_is_rejected() {
        for product in ["Premium", "premium_plus", "credit_5"] {
            let err = classify_json(json!({
                "payment_status": "COMPLETE",
                "custom_str1": "user-42",
                "custom_str2": product,
            }))
            .unwrap_err();
            assert!(matches!(err, WebhookError::UnknownProduct(_)), "{product}");
        }
    }
}
