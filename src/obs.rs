//! Observability: subscriber setup and masking of personal data before it is logged.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at debug and tower-http
/// request traces are kept.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_portal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Masks a national id as first digit, eight stars, last two digits.
///
/// Anything shorter than 11 characters is returned unchanged.
pub fn mask_national_id(national_id: &str) -> String {
    let chars: Vec<char> = national_id.chars().collect();
    if chars.len() < 11 {
        return national_id.to_string();
    }
    let mut masked = String::with_capacity(chars.len());
    masked.push(chars[0]);
    masked.push_str("********");
    masked.extend(&chars[9..]);
    masked
}

/// Masks a phone number as `5XX****XXX`.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 10 {
        return phone.to_string();
    }
    let mut masked: String = chars[..3].iter().collect();
    masked.push_str("****");
    masked.extend(&chars[7..]);
    masked
}

/// Groups a phone number for display, e.g. `532 123 45 67`.
pub fn display_phone(phone: &str) -> Option<String> {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 10 {
        return None;
    }
    let part = |range: std::ops::Range<usize>| chars[range].iter().collect::<String>();
    Some(format!(
        "{} {} {} {}",
        part(0..3),
        part(3..6),
        part(6..8),
        part(8..chars.len())
    ))
}

/// First 20 characters of a token followed by `...`.
pub fn truncate_token(token: &str) -> String {
    let prefix: String = token.chars().take(20).collect();
    format!("{}...", prefix)
}
