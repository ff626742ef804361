//! Recovery of the subject id from the bearer token returned by OTP verification.
//!
//! The token is only decoded, never verified: the signature belongs to the
//! upstream and the value is used as a hint next to the session's own id.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::Value;

/// Claims checked for the subject id, in priority order.
const SUBJECT_CLAIMS: &[&str] = &["customerId", "CustomerId", "sub"];

/// Returns the subject id carried in the token's payload, or `0`.
///
/// A claim that is missing, non-numeric or not positive is skipped. A token
/// that cannot be decoded, or has no usable claim, yields `0`.
pub fn subject_id_from_token(token: &str) -> i64 {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        tracing::debug!("Token does not have three segments ({})", parts.len());
        return 0;
    }

    let Some(payload) = decode_segment(parts[1]) else {
        tracing::debug!("Token payload is not valid base64");
        return 0;
    };

    let claims: Value = match serde_json::from_slice(&payload) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Token payload is not JSON: {}", e);
            return 0;
        }
    };

    SUBJECT_CLAIMS
        .iter()
        .filter_map(|name| claims.get(*name))
        .find_map(claim_as_id)
        .unwrap_or(0)
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .ok()
}

/// Non-positive ids count as absent so the next claim is tried.
fn claim_as_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(claims: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(claims);
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn reads_numeric_customer_id() {
        assert_eq!(subject_id_from_token(&token_with(r#"{"customerId":42}"#)), 42);
    }

    #[test]
    fn reads_string_claims_in_priority_order() {
        assert_eq!(subject_id_from_token(&token_with(r#"{"sub":"17"}"#)), 17);
        assert_eq!(
            subject_id_from_token(&token_with(r#"{"sub":"99","CustomerId":"5"}"#)),
            5
        );
    }

    #[test]
    fn skips_unusable_claim_for_next_one() {
        assert_eq!(
            subject_id_from_token(&token_with(r#"{"customerId":"abc","sub":8}"#)),
            8
        );
    }

    #[test]
    fn zero_or_negative_claim_falls_through() {
        assert_eq!(
            subject_id_from_token(&token_with(r#"{"customerId":0,"sub":"21"}"#)),
            21
        );
        assert_eq!(
            subject_id_from_token(&token_with(r#"{"customerId":"-4","CustomerId":6}"#)),
            6
        );
        assert_eq!(subject_id_from_token(&token_with(r#"{"customerId":0}"#)), 0);
    }

    #[test]
    fn malformed_tokens_yield_zero() {
        assert_eq!(subject_id_from_token(""), 0);
        assert_eq!(subject_id_from_token("only.two"), 0);
        assert_eq!(subject_id_from_token("a.b.c.d"), 0);
        assert_eq!(subject_id_from_token("x.!!!.y"), 0);
        assert_eq!(subject_id_from_token(&token_with("not json")), 0);
        assert_eq!(subject_id_from_token(&token_with(r#"{"name":"Ada"}"#)), 0);
    }

    #[test]
    fn padded_payload_is_accepted() {
        let payload = base64::engine::general_purpose::STANDARD.encode(r#"{"customerId":3}"#);
        assert_eq!(subject_id_from_token(&format!("h.{}.s", payload)), 3);
    }
}
