//! Server-side session state for the onboarding flow.
//!
//! A session is a map of named string values kept in a moka cache with an
//! idle expiry, keyed by a random id carried in an HTTP-only cookie. Handlers
//! never touch the map directly: they get a [`SessionContext`] from the
//! request extensions and go through its typed operations. Every write is a
//! read-modify-write of the whole map; concurrent tabs of the same browser
//! race and the last write wins.
//!
//! Completing authentication moves the session to a fresh id, so an id known
//! before the code was verified never reaches the authenticated state.

use crate::errors::AppError;
use crate::models::{Identity, TokenGrant, DEFAULT_DISPLAY_NAME};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{Redirect, Response},
};
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "credit_portal_sid";

/// Failed OTP attempts after which the user is told to request a new code.
pub const MAX_OTP_ATTEMPTS: u32 = 3;

pub const OTP_LOCKOUT_MESSAGE: &str = "3 kez yanlış kod girdiniz. Lütfen yeni kod talep edin.";

/// Names of the values held in a session.
pub mod keys {
    pub const SUBJECT_ID: &str = "CustomerId";
    pub const NATIONAL_ID: &str = "TCKN";
    pub const PHONE: &str = "GSM";
    pub const DISPLAY_NAME: &str = "CustomerName";
    pub const OTP_RETRY_COUNT: &str = "OtpRetryCount";
    pub const TOKEN: &str = "Token";
}

pub type SessionData = HashMap<String, String>;

/// Where a visitor stands in the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    /// Nothing stored yet, or the session was cleared or expired.
    Anonymous,
    /// Identity verified and a code requested; no failed attempt yet.
    IdentityPending,
    /// `n` failed verification attempts since the last code request.
    OtpFailed(u32),
    /// Code verified; profile and report pages are open.
    Authenticated,
}

impl FlowState {
    /// At `MAX_OTP_ATTEMPTS` the page stops inviting another attempt.
    pub fn needs_new_code(&self) -> bool {
        matches!(self, FlowState::OtpFailed(n) if *n >= MAX_OTP_ATTEMPTS)
    }
}

fn state_of(data: &SessionData) -> FlowState {
    let has_subject = subject_of(data).is_some();
    if has_subject && data.contains_key(keys::TOKEN) {
        return FlowState::Authenticated;
    }
    if has_subject || data.contains_key(keys::NATIONAL_ID) {
        return match retry_count_of(data) {
            0 => FlowState::IdentityPending,
            n => FlowState::OtpFailed(n),
        };
    }
    FlowState::Anonymous
}

fn subject_of(data: &SessionData) -> Option<i64> {
    data.get(keys::SUBJECT_ID)
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|id| *id > 0)
}

fn retry_count_of(data: &SessionData) -> u32 {
    data.get(keys::OTP_RETRY_COUNT)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Idle-expiring store of all sessions.
#[derive(Clone)]
pub struct SessionStore {
    cache: Cache<String, SessionData>,
    cookie_secure: bool,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration, cookie_secure: bool) -> Self {
        let cache = Cache::builder()
            .time_to_idle(idle_timeout)
            .max_capacity(100_000)
            .build();
        Self {
            cache,
            cookie_secure,
        }
    }

    pub fn context(&self, id: impl Into<String>) -> SessionContext {
        SessionContext {
            id: Arc::new(RwLock::new(id.into())),
            store: self.clone(),
        }
    }

    fn knows(&self, id: &str) -> bool {
        self.cache.contains_key(id)
    }

    /// `Set-Cookie` value for a session id.
    pub fn cookie_for(&self, id: &str) -> String {
        let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Strict", SESSION_COOKIE, id);
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// Cookie that removes the session id from the browser.
    pub fn expired_cookie(&self) -> String {
        let mut cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0",
            SESSION_COOKIE
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// One browser's session, as seen by a handler.
///
/// Clones share the id, so a rotation made by a handler is visible to the
/// middleware that issues the cookie.
#[derive(Clone)]
pub struct SessionContext {
    id: Arc<RwLock<String>>,
    store: SessionStore,
}

impl SessionContext {
    /// Current session id; changes once authentication completes.
    pub async fn id(&self) -> String {
        self.id.read().await.clone()
    }

    async fn snapshot(&self) -> SessionData {
        let id = self.id().await;
        self.store.cache.get(&id).await.unwrap_or_default()
    }

    async fn update(&self, change: impl FnOnce(&mut SessionData)) {
        let id = self.id().await;
        let mut data = self.store.cache.get(&id).await.unwrap_or_default();
        change(&mut data);
        if data.is_empty() {
            self.store.cache.invalidate(&id).await;
        } else {
            self.store.cache.insert(id, data).await;
        }
    }

    /// Moves the stored values under a fresh id; the old id stops resolving.
    async fn rotate_id(&self) {
        let mut id = self.id.write().await;
        let fresh = Uuid::new_v4().to_string();
        if let Some(data) = self.store.cache.remove(id.as_str()).await {
            self.store.cache.insert(fresh.clone(), data).await;
        }
        tracing::debug!("Session id rotated");
        *id = fresh;
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.snapshot().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: impl Into<String>) {
        let value = value.into();
        self.update(|data| {
            data.insert(key.to_string(), value);
        })
        .await;
    }

    pub async fn remove(&self, key: &str) {
        self.update(|data| {
            data.remove(key);
        })
        .await;
    }

    /// Drops every stored value.
    pub async fn clear(&self) {
        let id = self.id().await;
        self.store.cache.invalidate(&id).await;
    }

    pub async fn state(&self) -> FlowState {
        state_of(&self.snapshot().await)
    }

    /// Subject id when one is stored; `None` also covers a stored `0`.
    pub async fn subject_id(&self) -> Option<i64> {
        subject_of(&self.snapshot().await)
    }

    /// Subject id, but only once the code has been verified.
    pub async fn authenticated_subject(&self) -> Option<i64> {
        let data = self.snapshot().await;
        match state_of(&data) {
            FlowState::Authenticated => subject_of(&data),
            _ => None,
        }
    }

    pub async fn display_name(&self) -> String {
        self.get(keys::DISPLAY_NAME)
            .await
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
    }

    /// Stored national id and phone, for re-requesting a code.
    pub async fn contact(&self) -> (Option<String>, Option<String>) {
        let data = self.snapshot().await;
        (
            data.get(keys::NATIONAL_ID).cloned(),
            data.get(keys::PHONE).cloned(),
        )
    }

    pub async fn otp_retry_count(&self) -> u32 {
        retry_count_of(&self.snapshot().await)
    }

    /// Anonymous → IdentityPending. Any earlier progress is discarded.
    pub async fn record_identity(&self, identity: &Identity, national_id: &str, phone: &str) {
        let display_name = identity.display_name();
        self.update(|data| {
            data.clear();
            if identity.subject_id > 0 {
                data.insert(keys::SUBJECT_ID.to_string(), identity.subject_id.to_string());
            }
            data.insert(keys::NATIONAL_ID.to_string(), national_id.to_string());
            data.insert(keys::PHONE.to_string(), phone.to_string());
            data.insert(keys::DISPLAY_NAME.to_string(), display_name);
        })
        .await;
    }

    /// Stores contact details without a verified identity (OTP page query fallback).
    pub async fn remember_contact(&self, national_id: &str, phone: &str) {
        self.update(|data| {
            data.insert(keys::NATIONAL_ID.to_string(), national_id.to_string());
            data.insert(keys::PHONE.to_string(), phone.to_string());
        })
        .await;
    }

    /// Counts a failed attempt and returns the new total.
    pub async fn record_otp_failure(&self) -> u32 {
        let mut count = 0;
        self.update(|data| {
            count = retry_count_of(data) + 1;
            data.insert(keys::OTP_RETRY_COUNT.to_string(), count.to_string());
        })
        .await;
        count
    }

    /// A fresh code was requested; earlier failures no longer count.
    pub async fn reset_otp_failures(&self) {
        self.remove(keys::OTP_RETRY_COUNT).await;
    }

    /// Moves to Authenticated under a fresh session id.
    ///
    /// A grant whose subject id is `0` falls back to the id already in the
    /// session. Returns the subject id, or `None` when neither source has one;
    /// the session (id included) is left untouched in that case.
    pub async fn complete_authentication(&self, grant: &TokenGrant) -> Option<i64> {
        let mut subject = None;
        self.update(|data| {
            subject = Some(grant.subject_id)
                .filter(|id| *id > 0)
                .or_else(|| subject_of(data));
            let Some(id) = subject else {
                return;
            };
            data.insert(keys::SUBJECT_ID.to_string(), id.to_string());
            data.insert(keys::TOKEN.to_string(), grant.token.clone());
            data.remove(keys::OTP_RETRY_COUNT);
            data.entry(keys::DISPLAY_NAME.to_string())
                .or_insert_with(|| DEFAULT_DISPLAY_NAME.to_string());
        })
        .await;
        if subject.is_some() {
            self.rotate_id().await;
        }
        subject
    }
}

/// Where visitors without a verified identity are sent.
pub const IDENTITY_PATH: &str = "/onboarding/identity";

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| AppError::InternalError("session middleware not installed".to_string()))
    }
}

/// Subject id of an authenticated visitor.
///
/// Extracting it redirects everyone else to the identity step, which keeps
/// profile and report pages unreachable without a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Subject {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<SessionContext>() else {
            return Err(Redirect::to(IDENTITY_PATH));
        };
        match session.authenticated_subject().await {
            Some(id) => Ok(Subject(id)),
            None => {
                tracing::info!("No verified identity for {}, redirecting", parts.uri.path());
                Err(Redirect::to(IDENTITY_PATH))
            }
        }
    }
}

/// Reads a cookie value from the `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|c| c.strip_prefix(&prefix))
        .map(str::to_string)
}

/// Attaches a [`SessionContext`] to every request.
///
/// An unknown or malformed session id is replaced by a fresh one and the
/// cookie is (re)issued on the response. The cookie is also reissued when the
/// handler rotated the id.
pub async fn session_middleware(
    State(store): State<SessionStore>,
    mut req: Request,
    next: Next,
) -> Response {
    let existing = cookie_value(req.headers(), SESSION_COOKIE)
        .filter(|id| Uuid::parse_str(id).is_ok())
        .filter(|id| store.knows(id));

    let (id, issue_cookie) = match existing {
        Some(id) => (id, false),
        None => (Uuid::new_v4().to_string(), true),
    };

    let session = store.context(id.clone());
    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;

    let current = session.id().await;
    let rotated = current != id;
    // Handlers that end the session set their own expiring cookie.
    if (issue_cookie || rotated) && !response.headers().contains_key(header::SET_COOKIE) {
        if let Ok(value) = HeaderValue::from_str(&store.cookie_for(&current)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}
