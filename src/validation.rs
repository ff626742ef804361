//! Input validation for the onboarding steps and the four profile forms.
//!
//! Validators collect every problem instead of stopping at the first one, so
//! the page can show them all next to their fields.

use crate::models::{
    AddressSection, EmploymentSection, IncomeSection, SpouseSection, WORK_STATUS_NOT_WORKING,
};
use crate::{money, reference, regions};
use bigdecimal::{BigDecimal, Zero};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static NATIONAL_ID: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d{11}$").ok());
static PHONE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^5\d{9,10}$").ok());
static OTP_CODE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d{6}$").ok());
static POSTAL_CODE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d{5}$").ok());

fn is_match(pattern: &LazyLock<Option<Regex>>, text: &str) -> bool {
    pattern
        .as_ref()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// A validation problem tied to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

// ============ Onboarding ============

/// Strips spaces, dashes and parentheses a user may type into a phone number.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

pub fn validate_national_id(national_id: &str) -> Result<(), FieldError> {
    if national_id.trim().is_empty() {
        return Err(FieldError::new("tckn", "TC Kimlik No gereklidir."));
    }
    if !is_match(&NATIONAL_ID, national_id.trim()) {
        return Err(FieldError::new(
            "tckn",
            "TC Kimlik No 11 haneli olmalıdır.",
        ));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), FieldError> {
    if phone.trim().is_empty() {
        return Err(FieldError::new("gsm", "Cep telefonu gereklidir."));
    }
    if !is_match(&PHONE, &normalize_phone(phone)) {
        return Err(FieldError::new(
            "gsm",
            "Geçerli bir cep telefonu numarası giriniz (5XX XXX XX XX).",
        ));
    }
    Ok(())
}

pub fn validate_otp_code(code: &str) -> Result<(), FieldError> {
    if !is_match(&OTP_CODE, code.trim()) {
        return Err(FieldError::new("otpCode", "Doğrulama kodu 6 haneli olmalıdır."));
    }
    Ok(())
}

// ============ Form field readers ============

/// Reads an optional number from a form field; blank or unparseable input is `None`.
fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// Reads an HTML checkbox or a yes/no select.
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "on" | "1" | "yes"))
        .unwrap_or(false))
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============ Onboarding forms ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityForm {
    #[serde(alias = "TCKN")]
    pub tckn: String,
    #[serde(alias = "GSM")]
    pub gsm: String,
}

impl IdentityForm {
    /// Trimmed national id and phone without separators.
    pub fn normalized(&self) -> (String, String) {
        (self.tckn.trim().to_string(), normalize_phone(self.gsm.trim()))
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let (national_id, phone) = self.normalized();
        [validate_national_id(&national_id), validate_phone(&phone)]
            .into_iter()
            .filter_map(Result::err)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OtpForm {
    #[serde(alias = "OtpCode", alias = "otpcode")]
    pub otp_code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConsentForm {
    #[serde(deserialize_with = "checkbox")]
    pub accepted: bool,
}

impl ConsentForm {
    pub fn validate(&self) -> Vec<FieldError> {
        if self.accepted {
            Vec::new()
        } else {
            vec![FieldError::new(
                "accepted",
                "KVKK aydınlatma metnini kabul etmelisiniz.",
            )]
        }
    }
}

// ============ Profile forms ============

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressForm {
    #[serde(deserialize_with = "optional_number")]
    pub city_id: Option<i32>,
    #[serde(deserialize_with = "optional_number")]
    pub town_id: Option<i32>,
    pub address: String,
    pub postal_code: Option<String>,
}

impl AddressForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        match self.city_id {
            Some(id) if (1..=regions::PROVINCE_COUNT).contains(&id) => {}
            _ => errors.push(FieldError::new("cityId", "Lütfen il seçiniz.")),
        }
        match self.town_id {
            Some(id) if id >= 1 => {}
            _ => errors.push(FieldError::new("townId", "Lütfen ilçe seçiniz.")),
        }

        let length = self.address.trim().chars().count();
        if length == 0 {
            errors.push(FieldError::new("address", "Adres gereklidir."));
        } else if length < 10 {
            errors.push(FieldError::new("address", "Adres en az 10 karakter olmalıdır."));
        } else if length > 500 {
            errors.push(FieldError::new("address", "Adres en fazla 500 karakter olabilir."));
        }

        if let Some(postal) = trimmed(&self.postal_code) {
            if !is_match(&POSTAL_CODE, postal) {
                errors.push(FieldError::new("postalCode", "Posta kodu 5 haneli olmalıdır."));
            }
        }

        errors
    }

    pub fn into_section(self, subject_id: i64) -> AddressSection {
        let city = self
            .city_id
            .and_then(regions::region_name)
            .map(str::to_string);
        AddressSection {
            subject_id,
            city_id: self.city_id,
            town_id: self.town_id,
            address: Some(self.address.trim().to_string()),
            city,
            district: None,
            postal_code: trimmed(&self.postal_code).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmploymentForm {
    #[serde(deserialize_with = "optional_number")]
    pub work_status: Option<i32>,
    #[serde(deserialize_with = "optional_number")]
    pub job_id: Option<i32>,
    #[serde(deserialize_with = "optional_number")]
    pub sector_id: Option<i32>,
    pub company_name: Option<String>,
    pub position: Option<String>,
    #[serde(deserialize_with = "optional_number")]
    pub working_years: Option<i32>,
    #[serde(deserialize_with = "optional_number")]
    pub working_months: Option<i32>,
}

impl EmploymentForm {
    fn is_working(&self) -> bool {
        self.work_status != Some(WORK_STATUS_NOT_WORKING)
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.work_status.is_none() {
            errors.push(FieldError::new("workStatus", "Çalışma durumu seçimi gereklidir."));
        }

        if self.is_working() {
            if !self.job_id.is_some_and(|id| id > 0) {
                errors.push(FieldError::new("jobId", "Meslek seçimi gereklidir."));
            }
            if !self.sector_id.is_some_and(|id| id > 0) {
                errors.push(FieldError::new("sectorId", "Sektör seçimi gereklidir."));
            }
        }

        if self
            .company_name
            .as_deref()
            .is_some_and(|s| s.trim().chars().count() > 200)
        {
            errors.push(FieldError::new(
                "companyName",
                "Firma adı en fazla 200 karakter olabilir.",
            ));
        }
        if self
            .position
            .as_deref()
            .is_some_and(|s| s.trim().chars().count() > 100)
        {
            errors.push(FieldError::new(
                "position",
                "Pozisyon en fazla 100 karakter olabilir.",
            ));
        }
        if self.working_years.is_some_and(|y| !(0..=50).contains(&y)) {
            errors.push(FieldError::new(
                "workingYears",
                "Çalışma yılı 0-50 arasında olmalıdır.",
            ));
        }
        if self.working_months.is_some_and(|m| !(0..=11).contains(&m)) {
            errors.push(FieldError::new(
                "workingMonths",
                "Çalışma ayı 0-11 arasında olmalıdır.",
            ));
        }

        errors
    }

    /// A non-working customer is saved without job details.
    pub fn into_section(self, subject_id: i64) -> EmploymentSection {
        let working = self.is_working();
        EmploymentSection {
            subject_id,
            job_group_id: if working { self.job_id.unwrap_or(0) } else { 0 },
            sector_id: if working { self.sector_id } else { None },
            customer_work: self.work_status.unwrap_or(WORK_STATUS_NOT_WORKING),
            working_years: if working { self.working_years.unwrap_or(0) } else { 0 },
            working_month: if working { self.working_months.unwrap_or(0) } else { 0 },
            title_company: if working {
                trimmed(&self.company_name).map(str::to_string)
            } else {
                None
            },
            company_position: if working {
                trimmed(&self.position).map(str::to_string)
            } else {
                None
            },
        }
    }
}

/// 0 ..= 999 999 999.99
fn salary_in_range(amount: &BigDecimal) -> bool {
    let max = BigDecimal::from(99_999_999_999i64) / BigDecimal::from(100);
    *amount >= BigDecimal::zero() && *amount <= max
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeForm {
    pub salary_amount: Option<String>,
    pub salary_bank: Option<String>,
    #[serde(deserialize_with = "optional_number")]
    pub work_sector: Option<i32>,
    #[serde(deserialize_with = "checkbox")]
    pub car_status: bool,
    #[serde(deserialize_with = "checkbox")]
    pub house_status: bool,
}

impl IncomeForm {
    fn amount(&self) -> Option<BigDecimal> {
        self.salary_amount.as_deref().and_then(money::parse)
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        match (trimmed(&self.salary_amount), self.amount()) {
            (None, _) => errors.push(FieldError::new("salaryAmount", "Aylık net maaş gereklidir.")),
            (Some(_), Some(amount)) if salary_in_range(&amount) => {}
            (Some(_), _) => errors.push(FieldError::new(
                "salaryAmount",
                "Geçerli bir maaş miktarı giriniz.",
            )),
        }

        match trimmed(&self.salary_bank) {
            None => errors.push(FieldError::new("salaryBank", "Maaş bankası seçimi gereklidir.")),
            Some(bank) if !reference::is_known_bank(bank) => errors.push(FieldError::new(
                "salaryBank",
                "Geçerli bir banka seçiniz.",
            )),
            Some(_) => {}
        }

        if !self.work_sector.is_some_and(|id| id > 0) {
            errors.push(FieldError::new(
                "workSector",
                "Çalışma sektörü seçimi gereklidir.",
            ));
        }

        errors
    }

    pub fn into_section(self, subject_id: i64) -> IncomeSection {
        IncomeSection {
            subject_id,
            salary_amount: self.amount().unwrap_or_else(BigDecimal::zero),
            salary_bank: trimmed(&self.salary_bank).map(str::to_string),
            work_sector: self.work_sector.unwrap_or(0),
            car_status: self.car_status,
            house_status: self.house_status,
            job_group_name: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpouseForm {
    #[serde(deserialize_with = "checkbox")]
    pub marital_status: bool,
    #[serde(deserialize_with = "checkbox")]
    pub work_wife: bool,
    pub wife_salary_amount: Option<String>,
}

impl SpouseForm {
    fn amount(&self) -> Option<BigDecimal> {
        self.wife_salary_amount.as_deref().and_then(money::parse)
    }

    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let spouse_works = self.marital_status && self.work_wife;

        match self.amount() {
            Some(amount) if !salary_in_range(&amount) => errors.push(FieldError::new(
                "wifeSalaryAmount",
                "Geçerli bir maaş miktarı giriniz.",
            )),
            Some(amount) if spouse_works && amount <= BigDecimal::zero() => {
                errors.push(FieldError::new(
                    "wifeSalaryAmount",
                    "Eşiniz çalışıyorsa maaş bilgisi gereklidir.",
                ))
            }
            None if spouse_works => errors.push(FieldError::new(
                "wifeSalaryAmount",
                "Eşiniz çalışıyorsa maaş bilgisi gereklidir.",
            )),
            _ => {}
        }

        errors
    }

    /// An unmarried customer has no working spouse; a non-working spouse earns zero.
    pub fn into_section(self, subject_id: i64) -> SpouseSection {
        let work_wife = self.marital_status && self.work_wife;
        let wife_salary_amount = if work_wife {
            self.amount().unwrap_or_else(BigDecimal::zero)
        } else {
            BigDecimal::zero()
        };
        SpouseSection {
            subject_id,
            marital_status: self.marital_status,
            work_wife,
            wife_salary_amount,
        }
    }
}
