//! Route table and middleware stack.

use crate::handlers::{self, AppState};
use crate::session::session_middleware;
use axum::{
    http::{header, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    limit::RequestBodyLimitLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the application router.
///
/// `/health` sits outside the rate limiter. `rate_limit` is off in tests,
/// where requests carry no peer address for the key extractor.
pub fn router(state: Arc<AppState>, rate_limit: bool) -> Router {
    let pages = Router::new()
        .route("/", get(handlers::index))
        .route(
            "/onboarding/identity",
            get(handlers::identity_page).post(handlers::submit_identity),
        )
        .route(
            "/onboarding/otp",
            get(handlers::otp_page).post(handlers::submit_otp),
        )
        .route("/onboarding/otp/resend", post(handlers::resend_otp))
        .route(
            "/onboarding/consent",
            get(handlers::consent_page).post(handlers::submit_consent),
        )
        .route("/dashboard", get(handlers::dashboard))
        .route(
            "/profile/address",
            get(handlers::address_page).post(handlers::save_address),
        )
        .route(
            "/profile/employment",
            get(handlers::employment_page).post(handlers::save_employment),
        )
        .route(
            "/profile/income",
            get(handlers::income_page).post(handlers::save_income),
        )
        .route(
            "/profile/spouse",
            get(handlers::spouse_page).post(handlers::save_spouse),
        )
        .route("/reports", get(handlers::reports_page))
        .route("/reports/:id", get(handlers::report_detail_page))
        .route("/logout", get(handlers::logout).post(handlers::logout));

    let api = Router::new()
        .route("/api/currency-rate", get(handlers::currency_rate))
        .route("/api/crypto-price", get(handlers::crypto_price))
        .route("/api/kvkk-text", get(handlers::disclosure_text))
        .route("/api/otp/generate", post(handlers::generate_otp))
        .route("/api/otp/send-sms", post(handlers::send_otp_sms))
        .route("/api/otp/verify", post(handlers::verify_otp))
        .route("/api/regions", get(handlers::regions))
        .route("/api/regions/:id/sub-regions", get(handlers::sub_regions));

    let mut protected = pages
        .merge(api)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    if rate_limit {
        // 10 req/sec per client IP, burst of 20
        let governor_conf = GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish();
        match governor_conf {
            Some(config) => {
                protected = protected.layer(GovernorLayer {
                    config: Arc::new(config),
                });
            }
            None => tracing::warn!("Rate limiter configuration rejected, serving without it"),
        }
    }

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.sessions.clone(),
            session_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_XSS_PROTECTION,
                    HeaderValue::from_static("1; mode=block"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::REFERRER_POLICY,
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                )),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
