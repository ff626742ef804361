use crate::config::Config;
use crate::errors::{AppError, GatewayError};
use crate::gateway_client::ApiGatewayClient;
use crate::models::*;
use crate::obs::{display_phone, mask_national_id, mask_phone};
use crate::reference::{ReferenceData, BANKS};
use crate::session::{
    FlowState, SessionContext, SessionStore, Subject, IDENTITY_PATH, MAX_OTP_ATTEMPTS,
    OTP_LOCKOUT_MESSAGE,
};
use crate::validation::{
    validate_national_id, validate_otp_code, validate_phone, AddressForm, ConsentForm,
    EmploymentForm, FieldError, IdentityForm, IncomeForm, OtpForm, SpouseForm,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

pub const OTP_PATH: &str = "/onboarding/otp";
pub const CONSENT_PATH: &str = "/onboarding/consent";
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Disclosure shown on the consent step.
const CONSENT_DISCLOSURE_ID: i32 = 1;
/// Disclosure served by the JSON endpoint when no id is given.
const DEFAULT_DISCLOSURE_ID: i32 = 2;
/// Validity window quoted to the user; the upstream enforces the real one.
const OTP_VALIDITY_SECONDS: u32 = 120;

/// Shared application state injected into handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Façade over every external collaborator.
    pub gateway: ApiGatewayClient,
    /// Per-browser session storage.
    pub sessions: SessionStore,
    /// Occupation and sector lists.
    pub reference: ReferenceData,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let gateway = ApiGatewayClient::new(&config)?;
        let sessions = SessionStore::new(
            Duration::from_secs(config.session_idle_timeout_minutes * 60),
            config.session_cookie_secure,
        );
        let reference = ReferenceData::load(&config.reference_data_dir);
        Ok(Self {
            config,
            gateway,
            sessions,
            reference,
        })
    }
}

// ============ View state ============

/// View state of a page: its own data plus the messages every page can show.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView<T: Serialize> {
    pub page: &'static str,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_errors: Vec<FieldError>,
}

impl<T: Serialize> PageView<T> {
    fn new(page: &'static str, data: T) -> Self {
        Self {
            page,
            data,
            error_message: None,
            success_message: None,
            field_errors: Vec::new(),
        }
    }

    fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    fn error_if(self, message: Option<String>) -> Self {
        match message {
            Some(message) => self.error(message),
            None => self,
        }
    }

    fn success(mut self, message: impl Into<String>) -> Self {
        self.success_message = Some(message.into());
        self
    }

    fn fields(mut self, errors: Vec<FieldError>) -> Self {
        self.field_errors = errors;
        self
    }
}

impl<T: Serialize> IntoResponse for PageView<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub national_id: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpView {
    pub display_name: String,
    pub phone: Option<String>,
    pub retry_count: u32,
    pub needs_new_code: bool,
    pub code_validity_seconds: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentView {
    pub disclosure_id: i32,
    pub text: Option<String>,
}

/// A profile section that still needs input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingSection {
    pub key: &'static str,
    pub title: &'static str,
    pub path: &'static str,
}

const ADDRESS_SECTION: MissingSection = MissingSection {
    key: "address",
    title: "Adres Bilgileri",
    path: "/profile/address",
};
const EMPLOYMENT_SECTION: MissingSection = MissingSection {
    key: "employment",
    title: "Meslek Bilgileri",
    path: "/profile/employment",
};
const INCOME_SECTION: MissingSection = MissingSection {
    key: "income",
    title: "Gelir Bilgileri",
    path: "/profile/income",
};
const SPOUSE_SECTION: MissingSection = MissingSection {
    key: "spouse",
    title: "Eş Bilgileri",
    path: "/profile/spouse",
};

/// How much of the four-section profile is filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCompletion {
    pub percent: u8,
    pub missing_sections: Vec<MissingSection>,
}

impl ProfileCompletion {
    /// A section counts once it carries its key field; a failed read counts as missing.
    pub fn evaluate(
        address: Option<&AddressSection>,
        employment: Option<&EmploymentSection>,
        income: Option<&IncomeSection>,
        spouse_present: bool,
    ) -> Self {
        let checks = [
            (
                address.is_some_and(AddressSection::has_address_line),
                ADDRESS_SECTION,
            ),
            (employment.is_some_and(|e| e.job_group_id > 0), EMPLOYMENT_SECTION),
            (
                income.is_some_and(|i| i.salary_amount > bigdecimal::BigDecimal::from(0)),
                INCOME_SECTION,
            ),
            (spouse_present, SPOUSE_SECTION),
        ];

        let done = checks.iter().filter(|(complete, _)| *complete).count();
        let missing_sections = checks
            .iter()
            .filter(|(complete, _)| !complete)
            .map(|(_, section)| *section)
            .collect();

        Self {
            percent: (done * 100 / checks.len()) as u8,
            missing_sections,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub display_name: String,
    pub completion: ProfileCompletion,
    pub currency: Option<CurrencyRates>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressView {
    pub section: AddressSection,
    pub regions: Vec<Region>,
    pub sub_regions: Vec<SubRegion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentView {
    pub section: EmploymentSection,
    pub occupation_name: Option<String>,
    pub sector_name: Option<String>,
    pub occupations: Vec<LookupItem>,
    pub sectors: Vec<LookupItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeView {
    pub section: IncomeSection,
    pub banks: Vec<&'static str>,
    pub sectors: Vec<LookupItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpouseView {
    pub section: SpouseSection,
}

/// A report list entry with its status spelled out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    #[serde(flatten)]
    pub summary: ReportSummary,
    pub status_text: &'static str,
}

impl From<ReportSummary> for ReportRow {
    fn from(summary: ReportSummary) -> Self {
        let status_text = summary.status_text();
        Self {
            summary,
            status_text,
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportsView {
    pub reports: Vec<ReportRow>,
    pub selected: Option<ReportDetail>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetailView {
    pub report: Option<ReportDetail>,
}

// ============ Query and body shapes ============

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OtpPageQuery {
    pub tckn: Option<String>,
    pub gsm: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportsQuery {
    pub id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrencyQuery {
    pub currency_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CryptoQuery {
    pub symbols: Option<String>,
    pub convert: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DisclosureQuery {
    pub id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SendSmsRequest {
    #[serde(rename = "GSM", alias = "gsm")]
    pub gsm: String,
    #[serde(rename = "OtpCode", alias = "otpCode")]
    pub otp_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpIssued {
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub retry_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerified {
    pub subject_id: i64,
    pub next: &'static str,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============ Health ============

/// Health check endpoint.
///
/// Served outside the rate limiter and needs no session.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with service name and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "credit-portal",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

// ============ Onboarding ============

/// GET /
pub async fn index(session: SessionContext) -> Redirect {
    match session.state().await {
        FlowState::Authenticated => Redirect::to(DASHBOARD_PATH),
        _ => Redirect::to(IDENTITY_PATH),
    }
}

/// GET /onboarding/identity
pub async fn identity_page() -> PageView<IdentityView> {
    PageView::new("identity", IdentityView::default())
}

/// Requests a code and asks for it to be sent by SMS.
///
/// SMS delivery failures are logged and ignored; the user can request a new code.
async fn issue_code(
    state: &AppState,
    national_id: &str,
    phone: &str,
) -> Result<OneTimeCode, GatewayError> {
    let code = state.gateway.request_otp(national_id, phone).await?;
    if let Err(e) = state.gateway.send_otp_sms(phone, &code.otp_code).await {
        tracing::warn!("OTP SMS to {} failed: {}", mask_phone(phone), e);
    }
    Ok(code)
}

/// POST /onboarding/identity
///
/// Anonymous → IdentityPending, then a code is issued and the visitor is sent
/// to the OTP step.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session` - The visitor's session; earlier progress is discarded.
/// * `form` - National id and phone as typed.
///
/// # Returns
///
/// * `Response` - A 303 to the OTP step, or the identity page with errors.
pub async fn submit_identity(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Form(form): Form<IdentityForm>,
) -> Response {
    let (national_id, phone) = form.normalized();
    let view = PageView::new(
        "identity",
        IdentityView {
            national_id: Some(national_id.clone()),
            phone: Some(phone.clone()),
        },
    );

    let errors = form.validate();
    if !errors.is_empty() {
        return view.fields(errors).into_response();
    }

    tracing::info!(
        "POST identity - national_id={}, phone={}",
        mask_national_id(&national_id),
        mask_phone(&phone)
    );

    let identity = match state.gateway.verify_identity(&national_id, &phone).await {
        Ok(identity) => identity,
        Err(e) => return view.error(e.user_message()).into_response(),
    };
    session.record_identity(&identity, &national_id, &phone).await;

    match issue_code(&state, &national_id, &phone).await {
        Ok(_) => Redirect::to(OTP_PATH).into_response(),
        Err(e) => view.error(e.user_message()).into_response(),
    }
}

async fn otp_view(session: &SessionContext, phone: &str) -> PageView<OtpView> {
    let flow = session.state().await;
    let view = PageView::new(
        "otp",
        OtpView {
            display_name: session.display_name().await,
            phone: display_phone(phone),
            retry_count: session.otp_retry_count().await,
            needs_new_code: flow.needs_new_code(),
            code_validity_seconds: OTP_VALIDITY_SECONDS,
        },
    );
    if flow.needs_new_code() {
        view.error(OTP_LOCKOUT_MESSAGE)
    } else {
        view
    }
}

/// GET /onboarding/otp
///
/// National id and phone come from the session, or from the query string
/// when the session has none.
pub async fn otp_page(session: SessionContext, Query(query): Query<OtpPageQuery>) -> Response {
    if session.state().await == FlowState::Authenticated {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let (national_id, phone) = session.contact().await;
    let phone = match (national_id, phone) {
        (Some(_), Some(phone)) => phone,
        _ => {
            let (Some(national_id), Some(phone)) = (non_empty(query.tckn), non_empty(query.gsm))
            else {
                return Redirect::to(IDENTITY_PATH).into_response();
            };
            if validate_national_id(&national_id).is_err() || validate_phone(&phone).is_err() {
                return Redirect::to(IDENTITY_PATH).into_response();
            }
            session.remember_contact(&national_id, &phone).await;
            phone
        }
    };

    otp_view(&session, &phone).await.into_response()
}

/// Result of one verification attempt, after the session has been updated.
enum OtpAttempt {
    Verified(i64),
    /// Wrong or expired code; carries the text to show.
    Rejected(String),
    LockedOut,
    /// Code accepted but no subject id could be recovered anywhere.
    NoSubject,
    Failed(GatewayError),
}

/// Verifies a code and applies the session transitions for the outcome.
///
/// Only an upstream rejection counts as a failed attempt; timeouts and
/// transport faults leave the counter alone.
async fn attempt_otp(state: &AppState, session: &SessionContext, code: &str) -> OtpAttempt {
    if session.state().await.needs_new_code() {
        return OtpAttempt::LockedOut;
    }

    match state.gateway.verify_otp(code).await {
        Ok(grant) => match session.complete_authentication(&grant).await {
            Some(subject_id) => {
                tracing::info!("✓ Session authenticated for subject {}", subject_id);
                OtpAttempt::Verified(subject_id)
            }
            None => {
                tracing::warn!("OTP accepted but no subject id in token or session");
                OtpAttempt::NoSubject
            }
        },
        Err(GatewayError::ValidationFailed(message)) => {
            let failures = session.record_otp_failure().await;
            tracing::info!("OTP rejected ({} failed attempts)", failures);
            if failures >= MAX_OTP_ATTEMPTS {
                OtpAttempt::LockedOut
            } else {
                OtpAttempt::Rejected(message)
            }
        }
        Err(e) => OtpAttempt::Failed(e),
    }
}

const NO_SUBJECT_MESSAGE: &str = "Müşteri bilgisi alınamadı. Lütfen tekrar giriş yapın.";

/// POST /onboarding/otp
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session` - Must hold the contact stored by the identity step.
/// * `form` - The typed code.
///
/// # Returns
///
/// * `Response` - A 303 to the consent step once verified; otherwise the OTP page
///   with the reason.
pub async fn submit_otp(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Form(form): Form<OtpForm>,
) -> Response {
    let (national_id, phone) = session.contact().await;
    let (Some(_), Some(phone)) = (national_id, phone) else {
        tracing::warn!("OTP submitted without identity in session");
        return Redirect::to(IDENTITY_PATH).into_response();
    };

    if let Err(e) = validate_otp_code(&form.otp_code) {
        return otp_view(&session, &phone).await.fields(vec![e]).into_response();
    }

    match attempt_otp(&state, &session, form.otp_code.trim()).await {
        OtpAttempt::Verified(_) => Redirect::to(CONSENT_PATH).into_response(),
        OtpAttempt::LockedOut => otp_view(&session, &phone).await.into_response(),
        OtpAttempt::Rejected(message) => {
            otp_view(&session, &phone).await.error(message).into_response()
        }
        OtpAttempt::NoSubject => otp_view(&session, &phone)
            .await
            .error(NO_SUBJECT_MESSAGE)
            .into_response(),
        OtpAttempt::Failed(e) => otp_view(&session, &phone)
            .await
            .error(e.user_message())
            .into_response(),
    }
}

/// POST /onboarding/otp/resend
///
/// Issues a fresh code for the stored contact and clears earlier failures.
pub async fn resend_otp(State(state): State<Arc<AppState>>, session: SessionContext) -> Response {
    let (Some(national_id), Some(phone)) = session.contact().await else {
        return Redirect::to(IDENTITY_PATH).into_response();
    };

    match issue_code(&state, &national_id, &phone).await {
        Ok(_) => {
            session.reset_otp_failures().await;
            Redirect::to(OTP_PATH).into_response()
        }
        Err(e) => otp_view(&session, &phone)
            .await
            .error(e.user_message())
            .into_response(),
    }
}

/// GET /onboarding/consent
pub async fn consent_page(
    State(state): State<Arc<AppState>>,
    Subject(_subject_id): Subject,
) -> PageView<ConsentView> {
    let view = |text| {
        PageView::new(
            "consent",
            ConsentView {
                disclosure_id: CONSENT_DISCLOSURE_ID,
                text,
            },
        )
    };

    match state.gateway.get_disclosure_text(CONSENT_DISCLOSURE_ID).await {
        Ok(text) => view(Some(text)),
        Err(e) => view(None).error(e.user_message()),
    }
}

/// POST /onboarding/consent
pub async fn submit_consent(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Form(form): Form<ConsentForm>,
) -> Response {
    let view = PageView::new(
        "consent",
        ConsentView {
            disclosure_id: CONSENT_DISCLOSURE_ID,
            text: None,
        },
    );

    let errors = form.validate();
    if !errors.is_empty() {
        return view.fields(errors).into_response();
    }

    match state
        .gateway
        .save_disclosure_consent(CONSENT_DISCLOSURE_ID, subject_id)
        .await
    {
        Ok(()) => Redirect::to(DASHBOARD_PATH).into_response(),
        Err(e) => view.error(e.user_message()).into_response(),
    }
}

/// GET|POST /logout
///
/// LoggedOut → Anonymous: every stored value is dropped and the cookie expired.
pub async fn logout(State(state): State<Arc<AppState>>, session: SessionContext) -> Response {
    tracing::info!("Logging out session");
    session.clear().await;

    let mut response = Redirect::to(IDENTITY_PATH).into_response();
    if let Ok(value) = HeaderValue::from_str(&state.sessions.expired_cookie()) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

// ============ Dashboard ============

/// GET /dashboard
///
/// Sections are read one after another; a failed read only marks that
/// section as missing.
///
/// # Returns
///
/// * `PageView<DashboardView>` - Display name, profile completion and, when
///   available, the USD rates.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Subject(subject_id): Subject,
) -> PageView<DashboardView> {
    let gateway = &state.gateway;

    let address = gateway.get_address(subject_id).await;
    let employment = gateway.get_employment(subject_id).await;
    let income = gateway.get_income(subject_id).await;
    let spouse = gateway.get_spouse(subject_id).await;

    for (name, failed) in [
        ("address", address.as_ref().err()),
        ("employment", employment.as_ref().err()),
        ("income", income.as_ref().err()),
        ("spouse", spouse.as_ref().err()),
    ] {
        if let Some(e) = failed {
            tracing::warn!("Dashboard: {} section unavailable: {}", name, e);
        }
    }

    let completion = ProfileCompletion::evaluate(
        address.as_ref().ok(),
        employment.as_ref().ok(),
        income.as_ref().ok(),
        matches!(spouse, Ok(Some(_))),
    );

    let currency = match gateway.get_currency_rates("TRY").await {
        Ok(rates) => Some(rates),
        Err(e) => {
            tracing::warn!("Dashboard: currency snapshot unavailable: {}", e);
            None
        }
    };

    PageView::new(
        "dashboard",
        DashboardView {
            display_name: session.display_name().await,
            completion,
            currency,
        },
    )
}

// ============ Profile: address ============

async fn address_view(state: &AppState, section: AddressSection) -> PageView<AddressView> {
    let regions = state.gateway.get_regions().await;
    let sub_regions = match section.city_id {
        Some(city_id) if city_id > 0 => state.gateway.get_sub_regions(city_id).await,
        _ => Vec::new(),
    };
    PageView::new(
        "address",
        AddressView {
            section,
            regions,
            sub_regions,
        },
    )
}

/// GET /profile/address
pub async fn address_page(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
) -> PageView<AddressView> {
    let (section, error) = match state.gateway.get_address(subject_id).await {
        Ok(section) => (section, None),
        Err(e) => (AddressSection::empty(subject_id), Some(e.user_message())),
    };
    address_view(&state, section).await.error_if(error)
}

/// POST /profile/address
///
/// # Arguments
///
/// * `state` - The application state.
/// * `subject_id` - The authenticated customer.
/// * `form` - Province, district, street line and postal code.
///
/// # Returns
///
/// * `PageView<AddressView>` - The form again, with a success message or the
///   field and upstream errors.
pub async fn save_address(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Form(form): Form<AddressForm>,
) -> PageView<AddressView> {
    let errors = form.validate();
    let section = form.into_section(subject_id);
    if !errors.is_empty() {
        return address_view(&state, section).await.fields(errors);
    }

    match state.gateway.save_address(&section).await {
        Ok(()) => address_view(&state, section)
            .await
            .success("Adres bilgileriniz başarıyla kaydedildi."),
        Err(e) => address_view(&state, section).await.error(e.user_message()),
    }
}

// ============ Profile: employment ============

fn employment_view(state: &AppState, section: EmploymentSection) -> PageView<EmploymentView> {
    let reference = &state.reference;
    let occupation_name = reference
        .occupation_name(section.job_group_id)
        .map(str::to_string);
    let sector_name = section
        .sector_id
        .and_then(|id| reference.sector_name(id))
        .map(str::to_string);
    PageView::new(
        "employment",
        EmploymentView {
            section,
            occupation_name,
            sector_name,
            occupations: state.reference.occupations.clone(),
            sectors: state.reference.sectors.clone(),
        },
    )
}

/// GET /profile/employment
pub async fn employment_page(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
) -> PageView<EmploymentView> {
    match state.gateway.get_employment(subject_id).await {
        Ok(section) => employment_view(&state, section),
        Err(e) => employment_view(
            &state,
            EmploymentSection {
                subject_id,
                ..Default::default()
            },
        )
        .error(e.user_message()),
    }
}

/// POST /profile/employment
pub async fn save_employment(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Form(form): Form<EmploymentForm>,
) -> PageView<EmploymentView> {
    let errors = form.validate();
    let section = form.into_section(subject_id);
    if !errors.is_empty() {
        return employment_view(&state, section).fields(errors);
    }

    match state.gateway.save_employment(&section).await {
        Ok(()) => employment_view(&state, section)
            .success("Meslek bilgileriniz başarıyla kaydedildi."),
        Err(e) => employment_view(&state, section).error(e.user_message()),
    }
}

// ============ Profile: income ============

fn income_view(state: &AppState, section: IncomeSection) -> PageView<IncomeView> {
    PageView::new(
        "income",
        IncomeView {
            section,
            banks: BANKS.to_vec(),
            sectors: state.reference.sectors.clone(),
        },
    )
}

/// GET /profile/income
pub async fn income_page(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
) -> PageView<IncomeView> {
    match state.gateway.get_income(subject_id).await {
        Ok(section) => income_view(&state, section),
        Err(e) => income_view(
            &state,
            IncomeSection {
                subject_id,
                ..Default::default()
            },
        )
        .error(e.user_message()),
    }
}

/// POST /profile/income
pub async fn save_income(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Form(form): Form<IncomeForm>,
) -> PageView<IncomeView> {
    let errors = form.validate();
    let section = form.into_section(subject_id);
    if !errors.is_empty() {
        return income_view(&state, section).fields(errors);
    }

    match state.gateway.save_income(&section).await {
        Ok(()) => income_view(&state, section).success("Gelir bilgileriniz başarıyla kaydedildi."),
        Err(e) => income_view(&state, section).error(e.user_message()),
    }
}

// ============ Profile: spouse ============

fn spouse_view(section: SpouseSection) -> PageView<SpouseView> {
    PageView::new("spouse", SpouseView { section })
}

/// GET /profile/spouse
pub async fn spouse_page(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
) -> PageView<SpouseView> {
    let empty = SpouseSection {
        subject_id,
        ..Default::default()
    };
    match state.gateway.get_spouse(subject_id).await {
        Ok(section) => spouse_view(section.unwrap_or(empty)),
        Err(e) => spouse_view(empty).error(e.user_message()),
    }
}

/// POST /profile/spouse
pub async fn save_spouse(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Form(form): Form<SpouseForm>,
) -> PageView<SpouseView> {
    let errors = form.validate();
    let section = form.into_section(subject_id);
    if !errors.is_empty() {
        return spouse_view(section).fields(errors);
    }

    match state.gateway.save_spouse(&section).await {
        Ok(()) => spouse_view(section).success("Eş bilgileriniz başarıyla kaydedildi."),
        Err(e) => spouse_view(section).error(e.user_message()),
    }
}

// ============ Reports ============

const REPORT_NOT_FOUND: &str = "Rapor bulunamadı.";

/// GET /reports
///
/// Lists the subject's reports, newest first, with the detail of the one
/// selected by `?id=` or of the newest.
pub async fn reports_page(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Query(query): Query<ReportsQuery>,
) -> PageView<ReportsView> {
    let reports = match state.gateway.get_reports(subject_id).await {
        Ok(reports) => reports,
        Err(e) => return PageView::new("reports", ReportsView::default()).error(e.user_message()),
    };

    let selected_id = query.id.or_else(|| reports.first().map(|r| r.report_id));
    let mut error = None;
    let mut selected = None;

    if let Some(report_id) = selected_id {
        if !reports.iter().any(|r| r.report_id == report_id) {
            error = Some(REPORT_NOT_FOUND.to_string());
        } else {
            match state.gateway.get_report_detail(report_id).await {
                Ok(detail) => selected = Some(detail),
                Err(e) => error = Some(e.user_message()),
            }
        }
    }

    let reports = reports.into_iter().map(ReportRow::from).collect();
    PageView::new("reports", ReportsView { reports, selected }).error_if(error)
}

/// GET /reports/:id
///
/// Only reports listed for the session's subject are shown.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `subject_id` - The authenticated customer.
/// * `report_id` - The requested report.
///
/// # Returns
///
/// * `PageView<ReportDetailView>` - The detail, or an error when the report is
///   not the subject's own.
pub async fn report_detail_page(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    Path(report_id): Path<i64>,
) -> PageView<ReportDetailView> {
    let view = PageView::new("report", ReportDetailView::default());
    if report_id <= 0 {
        return view.error("Geçersiz rapor numarası.");
    }

    let owned = match state.gateway.get_reports(subject_id).await {
        Ok(reports) => reports.iter().any(|r| r.report_id == report_id),
        Err(e) => return view.error(e.user_message()),
    };
    if !owned {
        tracing::warn!(
            "Subject {} asked for report {} outside its list",
            subject_id,
            report_id
        );
        return view.error(REPORT_NOT_FOUND);
    }

    match state.gateway.get_report_detail(report_id).await {
        Ok(detail) => PageView::new(
            "report",
            ReportDetailView {
                report: Some(detail),
            },
        ),
        Err(e) => view.error(e.user_message()),
    }
}

// ============ JSON endpoints ============

/// GET /api/currency-rate?currencyCode=USD
///
/// Failures come back as `success: false` with a 200, never as an error status.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `query` - `currencyCode`, `USD` when absent.
pub async fn currency_rate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CurrencyQuery>,
) -> Json<ApiReply<CurrencyRates>> {
    let code = non_empty(query.currency_code).unwrap_or_else(|| "USD".to_string());
    match state.gateway.get_currency_rates(&code).await {
        Ok(rates) => Json(ApiReply::data(rates)),
        Err(e) => {
            tracing::warn!("Currency rate for {} unavailable: {}", code, e);
            Json(ApiReply::failure(e.user_message()))
        }
    }
}

/// GET /api/crypto-price?symbols=BTC,ETH&convert=TRY
pub async fn crypto_price(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CryptoQuery>,
) -> Json<ApiReply<CryptoPrices>> {
    let symbols = non_empty(query.symbols).unwrap_or_else(|| "BTC,ETH,BNB,SOL".to_string());
    let convert = non_empty(query.convert).unwrap_or_else(|| "TRY".to_string());
    match state.gateway.get_crypto_prices(&symbols, &convert).await {
        Ok(prices) => Json(ApiReply::data(prices)),
        Err(e) => {
            tracing::warn!("Crypto prices for {} unavailable: {}", symbols, e);
            Json(ApiReply::failure(e.user_message()))
        }
    }
}

/// GET /api/kvkk-text?id=2
///
/// # Returns
///
/// * `Result<Json<ApiReply<String>>, AppError>` - The disclosure text or an error.
pub async fn disclosure_text(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DisclosureQuery>,
) -> Result<Json<ApiReply<String>>, AppError> {
    let id = query.id.unwrap_or(DEFAULT_DISCLOSURE_ID);
    if id <= 0 {
        return Err(AppError::BadRequest("Geçersiz metin numarası.".to_string()));
    }
    let text = state.gateway.get_disclosure_text(id).await?;
    Ok(Json(ApiReply::value(text)))
}

fn first_error(errors: Vec<FieldError>) -> Option<AppError> {
    errors
        .into_iter()
        .next()
        .map(|e| AppError::BadRequest(e.message))
}

/// POST /api/otp/generate
///
/// Issues a code and sends it by SMS. The code itself stays server-side; the
/// browser only learns when it expires.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session` - Receives the contact details and a reset failure count.
/// * `request` - National id and phone.
///
/// # Returns
///
/// * `Result<Json<ApiReply<OtpIssued>>, AppError>` - Expiry and retry count, or an error.
pub async fn generate_otp(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Json(request): Json<IdentityForm>,
) -> Result<Json<ApiReply<OtpIssued>>, AppError> {
    if let Some(e) = first_error(request.validate()) {
        return Err(e);
    }
    let (national_id, phone) = request.normalized();

    let code = issue_code(&state, &national_id, &phone).await?;
    session.remember_contact(&national_id, &phone).await;
    session.reset_otp_failures().await;

    Ok(Json(ApiReply::value(OtpIssued {
        expires_at: code.expires_at,
        retry_count: code.retry_count,
    })))
}

/// POST /api/otp/send-sms
///
/// Only the phone held in the session can be texted.
pub async fn send_otp_sms(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Json(request): Json<SendSmsRequest>,
) -> Result<Json<ApiReply<bool>>, AppError> {
    let phone = crate::validation::normalize_phone(request.gsm.trim());
    validate_phone(&phone).map_err(|e| AppError::BadRequest(e.message))?;
    validate_otp_code(&request.otp_code).map_err(|e| AppError::BadRequest(e.message))?;

    let (_, session_phone) = session.contact().await;
    if session_phone.as_deref() != Some(phone.as_str()) {
        return Err(AppError::Unauthorized(
            "Oturum bilgisi bulunamadı. Lütfen tekrar giriş yapın.".to_string(),
        ));
    }

    state
        .gateway
        .send_otp_sms(&phone, request.otp_code.trim())
        .await?;
    Ok(Json(ApiReply::value(true)))
}

/// POST /api/otp/verify
///
/// Same transitions as the form flow; the token stays in the session.
///
/// # Returns
///
/// * `Result<Json<ApiReply<OtpVerified>>, AppError>` - Subject id and next step, or an error.
pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Json(request): Json<OtpForm>,
) -> Result<Json<ApiReply<OtpVerified>>, AppError> {
    if session.contact().await.1.is_none() {
        return Err(AppError::Unauthorized(
            "Oturum bilgisi bulunamadı. Lütfen tekrar giriş yapın.".to_string(),
        ));
    }
    validate_otp_code(&request.otp_code).map_err(|e| AppError::BadRequest(e.message))?;

    match attempt_otp(&state, &session, request.otp_code.trim()).await {
        OtpAttempt::Verified(subject_id) => Ok(Json(ApiReply::value(OtpVerified {
            subject_id,
            next: CONSENT_PATH,
        }))),
        OtpAttempt::LockedOut => Err(AppError::BadRequest(OTP_LOCKOUT_MESSAGE.to_string())),
        OtpAttempt::Rejected(message) => Err(AppError::BadRequest(message)),
        OtpAttempt::NoSubject => Err(AppError::Unauthorized(NO_SUBJECT_MESSAGE.to_string())),
        OtpAttempt::Failed(e) => Err(e.into()),
    }
}

/// GET /api/regions
pub async fn regions(State(state): State<Arc<AppState>>) -> Json<ApiReply<Vec<Region>>> {
    Json(ApiReply::value(state.gateway.get_regions().await))
}

/// GET /api/regions/:id/sub-regions
pub async fn sub_regions(
    State(state): State<Arc<AppState>>,
    Path(region_id): Path<i32>,
) -> Json<ApiReply<Vec<SubRegion>>> {
    Json(ApiReply::value(state.gateway.get_sub_regions(region_id).await))
}
