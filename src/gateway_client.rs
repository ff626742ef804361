use crate::config::{AccessCodes, Config};
use crate::envelope;
use crate::errors::GatewayError;
use crate::models::{
    lenient_opt_int, lenient_timestamp, AddressSaveRequest, AddressSection, CryptoPrices, CryptoQuote,
    CurrencyMeta, CurrencyRates, EmploymentSaveRequest, EmploymentSection, Identity,
    IncomeSection, OneTimeCode, Region, ReportDetail, ReportSummary, SpouseSection, SubRegion,
    TokenGrant,
};
use crate::obs::{mask_national_id, mask_phone, truncate_token};
use crate::{regions, token};
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Expiry assumed for a one-time code when the upstream does not send one.
const OTP_FALLBACK_TTL_MINUTES: i64 = 5;
/// Expiry assumed for a bearer token when the upstream does not send one.
const TOKEN_FALLBACK_TTL_HOURS: i64 = 24;
/// `source` value for records entered by the customer.
const SELF_ENTERED_SOURCE: i32 = 2;

/// Single façade over every external collaborator.
///
/// Holds one outbound HTTP client. Gateway APIs get the bearer credential
/// and their access code per request; the geography and market-data APIs are
/// called without them. Every operation returns `Result<T, GatewayError>`.
#[derive(Clone)]
pub struct ApiGatewayClient {
    client: reqwest::Client,
    customers_api_url: String,
    idc_api_url: String,
    geography_api_url: String,
    currency_api_url: String,
    crypto_api_url: String,
    crypto_api_key: Option<String>,
    token: String,
    codes: AccessCodes,
    utm_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OtpPayload {
    otpcode: Option<String>,
    code: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    expiresat: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_opt_int")]
    retrycount: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TokenPayload {
    token: Option<String>,
    accesstoken: Option<String>,
    #[serde(deserialize_with = "lenient_opt_int")]
    customerid: Option<i64>,
    #[serde(deserialize_with = "lenient_timestamp")]
    expiresat: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataList<T> {
    Data { data: Vec<T> },
    Bare(Vec<T>),
}

impl<T> DataList<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            DataList::Data { data } => data,
            DataList::Bare(items) => items,
        }
    }
}

impl ApiGatewayClient {
    /// Builds the client with the configured outbound deadline.
    ///
    /// # Arguments
    ///
    /// * `config` - Upstream base URLs, bearer token, access codes and timeout.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::Unexpected(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            customers_api_url: config.customers_api_url.clone(),
            idc_api_url: config.idc_api_url.clone(),
            geography_api_url: config.geography_api_url.clone(),
            currency_api_url: config.currency_api_url.clone(),
            crypto_api_url: config.crypto_api_url.clone(),
            crypto_api_key: config.crypto_api_key.clone(),
            token: config.api_bearer_token.clone(),
            codes: config.access_codes.clone(),
            utm_id: config.utm_id.clone(),
        })
    }

    // ============ Plumbing ============

    /// Adds the bearer credential and, when configured, the `?code=` parameter.
    fn authorized(&self, builder: RequestBuilder, code: Option<&String>) -> RequestBuilder {
        let builder = builder.bearer_auth(&self.token);
        match code {
            Some(code) => builder.query(&[("code", code.as_str())]),
            None => builder,
        }
    }

    /// Sends a request and returns status plus body text.
    ///
    /// Transport faults are logged here and converted; the caller only sees
    /// `Timeout` or `Unexpected`.
    async fn execute(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, String), GatewayError> {
        let response = builder.send().await.map_err(|e| {
            let err = GatewayError::from(e);
            if err.is_timeout() {
                tracing::error!("{}: upstream timed out", operation);
            } else {
                tracing::error!("{}: request failed: {}", operation, err);
            }
            err
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!("{}: failed to read response body: {}", operation, e);
            GatewayError::from(e)
        })?;

        Ok((status, body))
    }

    /// Turns a non-2xx answer into `ValidationFailed`, preferring the upstream message.
    fn reject(operation: &str, status: StatusCode, body: &str, default_message: &str) -> GatewayError {
        tracing::warn!("{}: upstream returned {}", operation, status);
        let message =
            envelope::error_message(body).unwrap_or_else(|| default_message.to_string());
        GatewayError::ValidationFailed(message)
    }

    fn decode<T: DeserializeOwned>(operation: &str, body: &str) -> Result<T, GatewayError> {
        envelope::decode(body).map_err(|e| {
            tracing::warn!("{}: {}", operation, e);
            e
        })
    }

    /// Shared read path for the four profile sections.
    ///
    /// 404 yields `None` so the caller can substitute an empty section.
    async fn fetch_section<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        code: Option<&String>,
    ) -> Result<Option<T>, GatewayError> {
        let url = format!("{}{}", self.customers_api_url, path);
        tracing::info!("{}: fetching {}", operation, url);

        let builder = self.authorized(self.client.get(&url), code);
        let (status, body) = self.execute(operation, builder).await?;

        if status == StatusCode::NOT_FOUND {
            tracing::info!("{}: no record upstream, using empty section", operation);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Self::reject(
                operation,
                status,
                &body,
                "Bilgiler alınamadı.",
            ));
        }

        Self::decode(operation, &body).map(Some)
    }

    /// Shared write path: POST the body, then read the `{ success, message }` outcome.
    async fn save_section<B: serde::Serialize>(
        &self,
        operation: &str,
        url: String,
        code: Option<&String>,
        body: &B,
    ) -> Result<(), GatewayError> {
        tracing::info!("{}: saving to {}", operation, url);

        let builder = self.authorized(self.client.post(&url), code).json(body);
        let (status, response_body) = self.execute(operation, builder).await?;

        if !status.is_success() {
            return Err(Self::reject(
                operation,
                status,
                &response_body,
                "Bilgiler kaydedilemedi.",
            ));
        }

        let outcome = envelope::save_outcome(&response_body);
        if outcome.success {
            tracing::info!("✓ {}: saved", operation);
            Ok(())
        } else {
            tracing::warn!("{}: upstream reported failure", operation);
            Err(GatewayError::ValidationFailed(
                outcome
                    .message
                    .unwrap_or_else(|| "Bilgiler kaydedilemedi.".to_string()),
            ))
        }
    }

    // ============ Identity & OTP ============

    /// Checks a national id / phone pair against the customer registry.
    ///
    /// # Arguments
    ///
    /// * `national_id` - The 11-digit national id.
    /// * `phone` - The normalized 10-digit mobile number.
    ///
    /// # Returns
    ///
    /// * `Result<Identity, GatewayError>` - The registry record; `ValidationFailed`
    ///   with the upstream message when the pair is rejected.
    pub async fn verify_identity(
        &self,
        national_id: &str,
        phone: &str,
    ) -> Result<Identity, GatewayError> {
        let operation = "verify_identity";
        let url = format!("{}/api/customer/tckn-gsm", self.customers_api_url);
        tracing::info!(
            "Verifying identity: national_id={}, phone={}",
            mask_national_id(national_id),
            mask_phone(phone)
        );

        let builder = self
            .authorized(self.client.post(&url), self.codes.verify_identity.as_ref())
            .json(&json!({ "TCKN": national_id, "GSM": phone }));
        let (status, body) = self.execute(operation, builder).await?;

        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "Doğrulama başarısız."));
        }

        let identity: Identity = Self::decode(operation, &body)?;
        tracing::info!(
            "✓ Identity verified: subject_id={}, national_id={}",
            identity.subject_id,
            mask_national_id(national_id)
        );
        Ok(identity)
    }

    /// Asks the identity API to issue a one-time code.
    ///
    /// The upstream may omit the expiry; a local fallback of five minutes is
    /// assumed then. The real window is enforced upstream.
    ///
    /// # Arguments
    ///
    /// * `national_id` - The verified national id.
    /// * `phone` - The phone the code is meant for.
    ///
    /// # Returns
    ///
    /// * `Result<OneTimeCode, GatewayError>` - The code, its expiry and retry count.
    pub async fn request_otp(
        &self,
        national_id: &str,
        phone: &str,
    ) -> Result<OneTimeCode, GatewayError> {
        let operation = "request_otp";
        let url = format!("{}/api/generate-otp", self.idc_api_url);
        tracing::info!(
            "Requesting OTP: national_id={}, phone={}",
            mask_national_id(national_id),
            mask_phone(phone)
        );

        let builder = self
            .authorized(self.client.post(&url), self.codes.generate_otp.as_ref())
            .json(&json!({ "tckn": national_id, "gsm": phone, "utmId": self.utm_id }));
        let (status, body) = self.execute(operation, builder).await?;

        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "OTP oluşturulamadı."));
        }

        let payload: OtpPayload = Self::decode(operation, &body)?;
        let otp_code = [payload.otpcode, payload.code]
            .into_iter()
            .flatten()
            .find(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                tracing::warn!("{}: response carried no code", operation);
                GatewayError::Unexpected("OTP response carried no code".to_string())
            })?;

        let expires_at = payload.expiresat.unwrap_or_else(|| {
            Utc::now() + ChronoDuration::minutes(OTP_FALLBACK_TTL_MINUTES)
        });

        tracing::info!(
            "✓ OTP issued for national_id={}",
            mask_national_id(national_id)
        );
        Ok(OneTimeCode {
            otp_code,
            expires_at,
            retry_count: payload.retrycount.unwrap_or(0),
        })
    }

    /// Triggers delivery of the code by SMS. Success is the HTTP status alone.
    ///
    /// # Arguments
    ///
    /// * `phone` - Destination number.
    /// * `otp_code` - The code to deliver.
    pub async fn send_otp_sms(&self, phone: &str, otp_code: &str) -> Result<(), GatewayError> {
        let operation = "send_otp_sms";
        let url = format!("{}/api/send-otp-sms", self.idc_api_url);
        tracing::info!("Sending OTP SMS to {}", mask_phone(phone));

        let builder = self
            .authorized(self.client.post(&url), self.codes.send_otp_sms.as_ref())
            .json(&json!({ "gsm": phone, "otpCode": otp_code }));
        let (status, body) = self.execute(operation, builder).await?;

        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "SMS gönderilemedi."));
        }

        tracing::info!("✓ OTP SMS sent to {}", mask_phone(phone));
        Ok(())
    }

    /// Verifies a one-time code and returns the issued token.
    ///
    /// `subject_id` comes from the body when present, otherwise from the
    /// token's claims; `0` means it could not be recovered.
    ///
    /// # Arguments
    ///
    /// * `otp_code` - The code typed by the user.
    ///
    /// # Returns
    ///
    /// * `Result<TokenGrant, GatewayError>` - Token, subject id and expiry.
    pub async fn verify_otp(&self, otp_code: &str) -> Result<TokenGrant, GatewayError> {
        let operation = "verify_otp";
        let url = format!("{}/api/verify-otp", self.idc_api_url);
        tracing::info!("Verifying OTP");

        let builder = self
            .authorized(self.client.post(&url), self.codes.verify_otp.as_ref())
            .json(&json!({ "otpCode": otp_code }));
        let (status, body) = self.execute(operation, builder).await?;

        if !status.is_success() {
            return Err(Self::reject(
                operation,
                status,
                &body,
                "OTP kodu geçersiz veya süresi dolmuş.",
            ));
        }

        let payload: TokenPayload = Self::decode(operation, &body)?;
        let token = [payload.token, payload.accesstoken]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .unwrap_or_default();

        let subject_id = match payload.customerid {
            Some(id) if id > 0 => id,
            _ => token::subject_id_from_token(&token),
        };
        let expires_at = payload
            .expiresat
            .unwrap_or_else(|| Utc::now() + ChronoDuration::hours(TOKEN_FALLBACK_TTL_HOURS));

        tracing::info!(
            "✓ OTP verified: token={}, subject_id={}",
            truncate_token(&token),
            subject_id
        );
        Ok(TokenGrant {
            token,
            subject_id,
            expires_at,
        })
    }

    // ============ Disclosure (KVKK) ============

    /// Fetches a disclosure text.
    ///
    /// A JSON body yields its text (empty when it has none); a body that is
    /// not JSON is the text itself.
    ///
    /// # Arguments
    ///
    /// * `disclosure_id` - Which disclosure to fetch.
    pub async fn get_disclosure_text(&self, disclosure_id: i32) -> Result<String, GatewayError> {
        let operation = "get_disclosure_text";
        let url = format!("{}/api/kvkk/text/{}", self.idc_api_url, disclosure_id);
        tracing::info!("Fetching disclosure text {}", disclosure_id);

        let builder = self.authorized(self.client.get(&url), self.codes.kvkk_text.as_ref());
        let (status, body) = self.execute(operation, builder).await?;

        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "KVKK metni alınamadı."));
        }

        match envelope::parse_normalized(&body) {
            Ok(value) => Ok(disclosure_text(value)),
            Err(_) => {
                tracing::debug!("{}: body is not JSON, using it verbatim", operation);
                Ok(body)
            }
        }
    }

    /// Records that the subject accepted the disclosure.
    ///
    /// # Arguments
    ///
    /// * `disclosure_id` - The accepted disclosure.
    /// * `subject_id` - The accepting customer.
    pub async fn save_disclosure_consent(
        &self,
        disclosure_id: i32,
        subject_id: i64,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/api/kvkk/onay", self.idc_api_url);
        let body = json!({ "kvkkId": disclosure_id, "customerId": subject_id, "isOk": true });
        self.save_section(
            "save_disclosure_consent",
            url,
            self.codes.kvkk_consent.as_ref(),
            &body,
        )
        .await
    }

    // ============ Profile sections ============

    /// Reads the address section; a missing record is an empty section.
    ///
    /// # Arguments
    ///
    /// * `subject_id` - The customer whose address to read.
    pub async fn get_address(&self, subject_id: i64) -> Result<AddressSection, GatewayError> {
        let section: Option<AddressSection> = self
            .fetch_section(
                "get_address",
                &format!("/api/customer/address/{}", subject_id),
                self.codes.address.as_ref(),
            )
            .await?;
        let mut section = section.unwrap_or_default();
        section.subject_id = subject_id;
        Ok(section)
    }

    /// Saves the address wholesale, as entered by the customer.
    pub async fn save_address(&self, section: &AddressSection) -> Result<(), GatewayError> {
        let request = AddressSaveRequest {
            customer_id: section.subject_id,
            adress: section.address.clone().unwrap_or_default(),
            city_id: section.city_id.unwrap_or_default(),
            town_id: section.town_id.unwrap_or_default(),
            source: SELF_ENTERED_SOURCE,
        };
        let url = format!("{}/api/customer/address", self.customers_api_url);
        self.save_section("save_address", url, self.codes.address_save.as_ref(), &request)
            .await
    }

    /// Reads the employment section; a missing record is an empty section.
    pub async fn get_employment(
        &self,
        subject_id: i64,
    ) -> Result<EmploymentSection, GatewayError> {
        let section: Option<EmploymentSection> = self
            .fetch_section(
                "get_employment",
                &format!("/api/customer/job-info/new/{}", subject_id),
                self.codes.job_info.as_ref(),
            )
            .await?;
        let mut section = section.unwrap_or_default();
        section.subject_id = subject_id;
        Ok(section)
    }

    pub async fn save_employment(&self, section: &EmploymentSection) -> Result<(), GatewayError> {
        let request = EmploymentSaveRequest::from_section(section);
        let url = format!("{}/api/customer/job-profile", self.customers_api_url);
        self.save_section("save_employment", url, self.codes.job_save.as_ref(), &request)
            .await
    }

    /// Reads the income section; a missing record is an empty section.
    pub async fn get_income(&self, subject_id: i64) -> Result<IncomeSection, GatewayError> {
        let section: Option<IncomeSection> = self
            .fetch_section(
                "get_income",
                &format!("/api/customer/finance-assets/{}", subject_id),
                self.codes.finance.as_ref(),
            )
            .await?;
        let mut section = section.unwrap_or_default();
        section.subject_id = subject_id;
        Ok(section)
    }

    pub async fn save_income(&self, section: &IncomeSection) -> Result<(), GatewayError> {
        let url = format!("{}/api/customer/finance-assets", self.customers_api_url);
        self.save_section("save_income", url, self.codes.finance_save.as_ref(), section)
            .await
    }

    /// Returns `None` when the registry holds no spouse record.
    pub async fn get_spouse(&self, subject_id: i64) -> Result<Option<SpouseSection>, GatewayError> {
        let section: Option<SpouseSection> = self
            .fetch_section(
                "get_spouse",
                &format!("/api/customer/wife-info/{}", subject_id),
                self.codes.spouse.as_ref(),
            )
            .await?;
        Ok(section.map(|mut s| {
            s.subject_id = subject_id;
            s
        }))
    }

    /// Saves the spouse section. A non-working spouse is saved with a zero salary.
    pub async fn save_spouse(&self, section: &SpouseSection) -> Result<(), GatewayError> {
        let mut section = section.clone();
        if !section.work_wife {
            section.wife_salary_amount = BigDecimal::zero();
        }
        let url = format!(
            "{}/api/customer/wife-info/{}",
            self.customers_api_url, section.subject_id
        );
        self.save_section("save_spouse", url, self.codes.spouse_save.as_ref(), &section)
            .await
    }

    // ============ Reports ============

    /// Reports for a subject, newest first.
    ///
    /// # Arguments
    ///
    /// * `subject_id` - The customer whose reports to list.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<ReportSummary>, GatewayError>` - Empty when the upstream answers 404.
    pub async fn get_reports(&self, subject_id: i64) -> Result<Vec<ReportSummary>, GatewayError> {
        let operation = "get_reports";
        let url = format!(
            "{}/api/customer/report-list/{}",
            self.customers_api_url, subject_id
        );
        tracing::info!("Fetching reports for subject {}", subject_id);

        let builder = self.authorized(self.client.get(&url), self.codes.reports.as_ref());
        let (status, body) = self.execute(operation, builder).await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "Raporlar alınamadı."));
        }

        let mut reports: Vec<ReportSummary> = Self::decode(operation, &body)?;
        reports.sort_by(|a, b| b.report_date.cmp(&a.report_date));
        tracing::info!("✓ {} reports for subject {}", reports.len(), subject_id);
        Ok(reports)
    }

    /// Full detail of one report.
    ///
    /// # Arguments
    ///
    /// * `report_id` - Must be positive; ownership is checked by the caller.
    ///
    /// # Returns
    ///
    /// * `Result<ReportDetail, GatewayError>` - `NotFound` when the upstream has no such report.
    pub async fn get_report_detail(&self, report_id: i64) -> Result<ReportDetail, GatewayError> {
        let operation = "get_report_detail";
        if report_id <= 0 {
            return Err(GatewayError::ValidationFailed(
                "Geçersiz rapor numarası.".to_string(),
            ));
        }

        let url = format!(
            "{}/api/customer/report-detail/{}",
            self.customers_api_url, report_id
        );
        tracing::info!("Fetching report detail {}", report_id);

        let builder = self.authorized(self.client.get(&url), self.codes.report_detail.as_ref());
        let (status, body) = self.execute(operation, builder).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound);
        }
        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "Rapor detayı alınamadı."));
        }

        let mut detail: ReportDetail = Self::decode(operation, &body)?;
        if detail.report_id == 0 {
            detail.report_id = report_id;
        }
        Ok(detail)
    }

    // ============ Geography ============

    /// Provinces from the open geography API, or the static table.
    ///
    /// Never fails: an error or an empty answer falls back to the built-in list.
    pub async fn get_regions(&self) -> Vec<Region> {
        let url = format!("{}/v1/provinces", self.geography_api_url);
        match self.fetch_geo_list::<Region>("get_regions", self.client.get(&url)).await {
            Ok(items) if !items.is_empty() => items,
            Ok(_) => {
                tracing::warn!("Geography API returned no provinces, using static table");
                regions::fallback_regions()
            }
            Err(e) => {
                tracing::warn!("Geography API failed ({}), using static table", e);
                regions::fallback_regions()
            }
        }
    }

    /// Districts of a province, or the partial static table.
    pub async fn get_sub_regions(&self, region_id: i32) -> Vec<SubRegion> {
        let url = format!("{}/v1/districts", self.geography_api_url);
        let builder = self
            .client
            .get(&url)
            .query(&[("provinceId", region_id.to_string())]);

        match self.fetch_geo_list::<SubRegion>("get_sub_regions", builder).await {
            Ok(items) if !items.is_empty() => items
                .into_iter()
                .map(|mut d| {
                    if d.region_id == 0 {
                        d.region_id = region_id;
                    }
                    d
                })
                .collect(),
            Ok(_) => {
                tracing::warn!(
                    "Geography API returned no districts for {}, using static table",
                    region_id
                );
                regions::fallback_sub_regions(region_id)
            }
            Err(e) => {
                tracing::warn!(
                    "Geography API failed for districts of {} ({}), using static table",
                    region_id,
                    e
                );
                regions::fallback_sub_regions(region_id)
            }
        }
    }

    async fn fetch_geo_list<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
    ) -> Result<Vec<T>, GatewayError> {
        let (status, body) = self.execute(operation, builder).await?;
        if !status.is_success() {
            return Err(GatewayError::Unexpected(format!("geography API returned {}", status)));
        }
        let value = envelope::parse_normalized(&body)?;
        serde_json::from_value::<DataList<T>>(value)
            .map(DataList::into_vec)
            .map_err(|e| GatewayError::Unexpected(format!("unreadable geography payload: {}", e)))
    }

    // ============ Market data ============

    /// Exchange rates for a base currency code.
    ///
    /// # Arguments
    ///
    /// * `code` - Base currency, e.g. `try` or `USD`.
    ///
    /// # Returns
    ///
    /// * `Result<CurrencyRates, GatewayError>` - Rates as exact decimals.
    pub async fn get_currency_rates(&self, code: &str) -> Result<CurrencyRates, GatewayError> {
        let operation = "get_currency_rates";
        let code = code.trim();
        if code.is_empty() {
            return Err(GatewayError::ValidationFailed(
                "Döviz kodu belirtilmedi.".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/{}.json",
            self.currency_api_url,
            code.to_lowercase()
        );
        tracing::info!("Fetching currency rates for {}", code);

        let (status, body) = self.execute(operation, self.client.get(&url)).await?;
        if !status.is_success() {
            return Err(Self::reject(operation, status, &body, "Döviz kurları alınamadı."));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Unexpected(format!("currency payload is not JSON: {}", e)))?;
        let Value::Object(entries) = value else {
            return Err(GatewayError::Unexpected(
                "currency payload is not an object".to_string(),
            ));
        };

        let mut rates = BTreeMap::new();
        let mut meta = None;
        for (key, entry) in entries {
            if key == "_meta" {
                meta = serde_json::from_value::<CurrencyMeta>(entry).ok();
                continue;
            }
            if entry.is_null() {
                continue;
            }
            match crate::money::deserialize(entry) {
                Ok(rate) => {
                    rates.insert(key, rate);
                }
                Err(e) => tracing::debug!("{}: skipping {}: {}", operation, key, e),
            }
        }

        if rates.is_empty() {
            return Err(GatewayError::Unexpected("currency payload carried no rates".to_string()));
        }

        let base = meta
            .as_ref()
            .and_then(|m| m.base.clone())
            .unwrap_or_else(|| code.to_uppercase());
        Ok(CurrencyRates { base, rates, meta })
    }

    /// Latest quotes for comma separated symbols, converted to `convert`.
    ///
    /// # Arguments
    ///
    /// * `symbols` - e.g. `BTC,ETH`.
    /// * `convert` - Quote currency.
    pub async fn get_crypto_prices(
        &self,
        symbols: &str,
        convert: &str,
    ) -> Result<CryptoPrices, GatewayError> {
        let operation = "get_crypto_prices";
        let url = format!("{}/v1/cryptocurrency/quotes/latest", self.crypto_api_url);
        let convert = convert.trim().to_uppercase();
        tracing::info!("Fetching crypto prices for {} in {}", symbols, convert);

        let mut builder = self
            .client
            .get(&url)
            .query(&[("symbol", symbols.trim()), ("convert", convert.as_str())]);
        if let Some(key) = &self.crypto_api_key {
            builder = builder.header("X-CMC_PRO_API_KEY", key);
        }

        let (status, body) = self.execute(operation, builder).await?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| GatewayError::Unexpected(format!("crypto payload is not JSON: {}", e)))?;

        let error_code = value
            .pointer("/status/error_code")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        if !status.is_success() || error_code != 0 {
            let message = value
                .pointer("/status/error_message")
                .and_then(Value::as_str)
                .unwrap_or("Kripto fiyatları alınamadı.")
                .to_string();
            tracing::warn!("{}: upstream returned {} ({})", operation, status, error_code);
            return Err(GatewayError::ValidationFailed(message));
        }

        let quotes = value
            .get("data")
            .and_then(Value::as_object)
            .map(|data| {
                data.values()
                    .filter_map(|entry| match entry {
                        Value::Array(items) => items.first(),
                        other => Some(other),
                    })
                    .filter_map(|entry| crypto_quote(entry, &convert))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(CryptoPrices { quotes })
    }
}

/// Text of a JSON disclosure body: a plain string, or the `text` field of an
/// object, either one optionally under `value`. Other shapes carry no text.
fn disclosure_text(value: Value) -> String {
    match envelope::unwrap_value(value).into_inner() {
        Value::String(text) => text,
        Value::Object(fields) => fields
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

fn crypto_quote(entry: &Value, convert: &str) -> Option<CryptoQuote> {
    let quote = entry.get("quote")?.get(convert)?;
    let decimal = |v: Option<&Value>| {
        v.filter(|v| !v.is_null())
            .and_then(|v| crate::money::deserialize(v.clone()).ok())
    };

    Some(CryptoQuote {
        id: entry.get("id").and_then(Value::as_i64).unwrap_or_default(),
        symbol: entry.get("symbol")?.as_str()?.to_string(),
        name: entry
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        convert: convert.to_string(),
        price: decimal(quote.get("price"))?,
        percent_change_24h: decimal(quote.get("percent_change_24h")),
        last_updated: quote
            .get("last_updated")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}
