//! PayFast ITN signature verification.
//!
//! The gateway signs an MD5 digest of `key=value&...` over a fixed, ordered set
//! of fields, optionally followed by `&passphrase=<secret>`. MD5 is the
//! gateway's protocol, not a choice made here.

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

use crate::webhooks::payload::WebhookPayload;

/// Fields covered by the signature, in the order the gateway concatenates them.
pub const SIGNED_FIELDS: [&str; 22] = [
    "m_payment_id",
    "pf_payment_id",
    "payment_status",
    "item_name",
    "item_description",
    "amount_gross",
    "amount_fee",
    "amount_net",
    "custom_str1",
    "custom_str2",
    "custom_str3",
    "custom_str4",
    "custom_str5",
    "custom_int1",
    "custom_int2",
    "custom_int3",
    "custom_int4",
    "custom_int5",
    "name_first",
    "name_last",
    "email_address",
    "merchant_id",
];

#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    passphrase: Option<String>,
}

impl SignatureVerifier {
    /// A blank passphrase is treated as none.
    pub fn new(passphrase: Option<String>) -> Self {
        Self {
            passphrase: passphrase.filter(|p| !p.trim().is_empty()),
        }
    }

    /// Builds the exact string the gateway hashes.
    pub fn canonical_string(&self, payload: &WebhookPayload) -> String {
        let mut out = String::new();
        for key in SIGNED_FIELDS {
            let Some(value) = payload.get(key) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            out.push_str(key);
            out.push('=');
            out.push_str(&form_encode(value));
            out.push('&');
        }
        // trailing separator
        out.pop();

        if let Some(passphrase) = &self.passphrase {
            out.push_str("&passphrase=");
            out.push_str(&form_encode(passphrase.trim()));
        }
        out
    }

    /// Lowercase hex MD5 of the canonical string.
    pub fn expected_signature(&self, payload: &WebhookPayload) -> String {
        hex::encode(Md5::digest(self.canonical_string(payload).as_bytes()))
    }

    /// True only when the supplied `signature` matches exactly.
    pub fn verify(&self, payload: &WebhookPayload) -> bool {
        let Some(provided) = payload.signature.as_deref() else {
            return false;
        };
        let expected = self.expected_signature(payload);
        if expected.len() != provided.len() {
            return false;
        }
        expected.as_bytes().ct_eq(provided.as_bytes()).into()
    }
}

/// Escapes `urlencoding` emits that the gateway's canonical form keeps
/// literal. Together they give `encodeURIComponent` with spaces as `+`:
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )` pass through and everything else is
/// percent-encoded as UTF-8.
const GATEWAY_LITERALS: [(&str, &str); 6] = [
    ("%20", "+"),
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

fn form_encode(value: &str) -> String {
    // `%` itself becomes `%25`, so these escapes cannot be forged by input.
    GATEWAY_LITERALS
        .iter()
        .fold(urlencoding::encode(value).into_owned(), |acc, (escape, literal)| {
            acc.replace(escape, literal)
        })
}
