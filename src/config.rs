use serde::Deserialize;

/// Per-endpoint access codes appended to upstream URLs as `?code=`.
///
/// Each one is optional; an absent code means the endpoint is called without it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessCodes {
    pub verify_identity: Option<String>,
    pub kvkk_text: Option<String>,
    pub kvkk_consent: Option<String>,
    pub generate_otp: Option<String>,
    pub send_otp_sms: Option<String>,
    pub verify_otp: Option<String>,
    pub address: Option<String>,
    pub address_save: Option<String>,
    pub job_info: Option<String>,
    pub job_save: Option<String>,
    pub finance: Option<String>,
    pub finance_save: Option<String>,
    pub spouse: Option<String>,
    pub spouse_save: Option<String>,
    pub reports: Option<String>,
    pub report_detail: Option<String>,
}

impl AccessCodes {
    fn from_env() -> Self {
        let code = |op: &str| {
            std::env::var(format!("ACCESS_CODE_{}", op))
                .ok()
                .filter(|s| !s.trim().is_empty())
        };

        Self {
            verify_identity: code("VERIFY_IDENTITY"),
            kvkk_text: code("KVKK_TEXT"),
            kvkk_consent: code("KVKK_CONSENT"),
            generate_otp: code("GENERATE_OTP"),
            send_otp_sms: code("SEND_OTP_SMS"),
            verify_otp: code("VERIFY_OTP"),
            address: code("ADDRESS"),
            address_save: code("ADDRESS_SAVE"),
            job_info: code("JOB_INFO"),
            job_save: code("JOB_SAVE"),
            finance: code("FINANCE"),
            finance_save: code("FINANCE_SAVE"),
            spouse: code("SPOUSE"),
            spouse_save: code("SPOUSE_SAVE"),
            reports: code("REPORTS"),
            report_detail: code("REPORT_DETAIL"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub customers_api_url: String,
    pub idc_api_url: String,
    pub geography_api_url: String,
    pub currency_api_url: String,
    pub crypto_api_url: String,
    pub crypto_api_key: Option<String>,
    pub api_bearer_token: String,
    pub access_codes: AccessCodes,
    pub utm_id: String,
    pub upstream_timeout_secs: u64,
    pub session_idle_timeout_minutes: u64,
    pub session_cookie_secure: bool,
    pub reference_data_dir: String,
}

fn base_url(var: &str, default: &str) -> anyhow::Result<String> {
    let url = std::env::var(var).unwrap_or_else(|_| default.to_string());
    if url.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", var);
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", var);
    }
    Ok(url.trim_end_matches('/').to_string())
}

fn number<T: std::str::FromStr>(var: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", var)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            customers_api_url: base_url(
                "CUSTOMERS_API_URL",
                "https://customers-api.azurewebsites.net",
            )?,
            idc_api_url: base_url("IDC_API_URL", "https://api-idc.azurewebsites.net")?,
            geography_api_url: base_url("GEOGRAPHY_API_URL", "https://api.turkiyeapi.dev")?,
            currency_api_url: base_url("CURRENCY_API_URL", "https://doviz.dev")?,
            crypto_api_url: base_url("CRYPTO_API_URL", "https://pro-api.coinmarketcap.com")?,
            crypto_api_key: std::env::var("CRYPTO_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            api_bearer_token: std::env::var("API_BEARER_TOKEN")
                .map_err(|_| anyhow::anyhow!("API_BEARER_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("API_BEARER_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            access_codes: AccessCodes::from_env(),
            utm_id: std::env::var("UTM_ID")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "5".to_string()),
            upstream_timeout_secs: number("UPSTREAM_TIMEOUT_SECS", 30u64)?,
            session_idle_timeout_minutes: number("SESSION_IDLE_TIMEOUT_MINUTES", 30u64)?,
            session_cookie_secure: std::env::var("SESSION_COOKIE_SECURE")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            reference_data_dir: std::env::var("REFERENCE_DATA_DIR")
                .unwrap_or_else(|_| "data".to_string()),
        };

        if config.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }
        if config.session_idle_timeout_minutes == 0 {
            anyhow::bail!("SESSION_IDLE_TIMEOUT_MINUTES must be greater than zero");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Customers API URL: {}", config.customers_api_url);
        tracing::debug!("IDC API URL: {}", config.idc_api_url);
        tracing::debug!("Geography API URL: {}", config.geography_api_url);
        tracing::debug!("Currency API URL: {}", config.currency_api_url);
        tracing::debug!("Crypto API URL: {}", config.crypto_api_url);
        tracing::debug!(
            "Session idle timeout: {}m, secure cookie: {}",
            config.session_idle_timeout_minutes,
            config.session_cookie_secure
        );
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// Configuration pointing every upstream at one base URL.
    ///
    /// Used by tests that stand a single mock server in for all collaborators.
    pub fn for_single_upstream(base_url: &str) -> Self {
        Self {
            port: 0,
            customers_api_url: base_url.to_string(),
            idc_api_url: base_url.to_string(),
            geography_api_url: base_url.to_string(),
            currency_api_url: base_url.to_string(),
            crypto_api_url: base_url.to_string(),
            crypto_api_key: None,
            api_bearer_token: "test-token".to_string(),
            access_codes: AccessCodes::default(),
            utm_id: "5".to_string(),
            upstream_timeout_secs: 30,
            session_idle_timeout_minutes: 30,
            session_cookie_secure: false,
            reference_data_dir: "data".to_string(),
        }
    }
}
