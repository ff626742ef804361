use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

// ============ Lenient field helpers ============

/// Reads `null` as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A number as the upstream may send it: integer, float or numeric text.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl NumberOrText {
    /// Blank text reads as no value.
    fn to_i64(&self) -> Result<Option<i64>, String> {
        match self {
            NumberOrText::Integer(n) => Ok(Some(*n)),
            NumberOrText::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(*f as i64)),
            NumberOrText::Float(f) => Err(format!("expected an integer, got {}", f)),
            NumberOrText::Text(s) if s.trim().is_empty() => Ok(None),
            NumberOrText::Text(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| format!("expected a numeric string, got {:?}", s)),
        }
    }
}

/// Integer that may arrive as a number or numeric string; `null` or blank is the default.
pub fn lenient_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    Ok(lenient_opt_int(deserializer)?.unwrap_or_default())
}

/// Optional form of [`lenient_int`].
pub fn lenient_opt_int<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let Some(raw) = Option::<NumberOrText>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.to_i64().map_err(D::Error::custom)? {
        None => Ok(None),
        Some(n) => T::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("{} is out of range", n))),
    }
}

/// Parses RFC 3339 as well as the zone-less `2024-05-01T10:00:00(.fff)` form,
/// which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Optional timestamp; unparseable text becomes `None` instead of an error.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

// ============ Identity & OTP ============

/// Display name used when the registry has none.
pub const DEFAULT_DISPLAY_NAME: &str = "Müşteri";

/// A verified individual as returned by the identity check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase", deserialize = "lowercase"))]
pub struct Identity {
    #[serde(
        rename(serialize = "subjectId", deserialize = "customerid"),
        deserialize_with = "lenient_int"
    )]
    pub subject_id: i64,
    #[serde(rename(serialize = "nationalId", deserialize = "tckn"))]
    pub national_id: Option<String>,
    #[serde(rename(serialize = "phone", deserialize = "gsm"))]
    pub phone: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
}

impl Identity {
    /// Name and surname joined, or the default display name.
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.name.as_deref(), self.surname.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            DEFAULT_DISPLAY_NAME.to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// A one-time code issued for one verification attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OneTimeCode {
    pub otp_code: String,
    pub expires_at: DateTime<Utc>,
    pub retry_count: u32,
}

/// Result of a successful OTP verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub token: String,
    /// `0` means the subject could not be recovered from the response.
    pub subject_id: i64,
    pub expires_at: DateTime<Utc>,
}

// ============ Profile sections ============

/// Residential address. Fetched wholesale and saved wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "AddressRecord", rename_all = "camelCase")]
pub struct AddressSection {
    pub subject_id: i64,
    pub city_id: Option<i32>,
    pub town_id: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
}

/// Address as the registry sends it. The street line may come under the
/// current key, the misspelt save key or the legacy `AddressLine`, sometimes
/// several at once.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AddressRecord {
    #[serde(deserialize_with = "lenient_int")]
    customerid: i64,
    #[serde(deserialize_with = "lenient_opt_int")]
    cityid: Option<i32>,
    #[serde(deserialize_with = "lenient_opt_int")]
    townid: Option<i32>,
    address: Option<String>,
    adress: Option<String>,
    addressline: Option<String>,
    city: Option<String>,
    district: Option<String>,
    postalcode: Option<String>,
}

impl From<AddressRecord> for AddressSection {
    fn from(record: AddressRecord) -> Self {
        let address = [record.address, record.adress, record.addressline]
            .into_iter()
            .flatten()
            .find(|line| !line.trim().is_empty());
        Self {
            subject_id: record.customerid,
            city_id: record.cityid,
            town_id: record.townid,
            address,
            city: record.city,
            district: record.district,
            postal_code: record.postalcode,
        }
    }
}

impl AddressSection {
    pub fn empty(subject_id: i64) -> Self {
        Self {
            subject_id,
            ..Self::default()
        }
    }

    pub fn has_address_line(&self) -> bool {
        self.address
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Body of the address save call, in the upstream's own spelling.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSaveRequest {
    pub customer_id: i64,
    pub adress: String,
    pub city_id: i32,
    pub town_id: i32,
    /// 2 = entered by the customer, 1 = entered by an advisor.
    pub source: i32,
}

/// Employment (job profile) section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct EmploymentSection {
    #[serde(
        rename(serialize = "subjectId", deserialize = "customerid"),
        deserialize_with = "lenient_int"
    )]
    pub subject_id: i64,
    #[serde(rename(deserialize = "jobgroupid"), deserialize_with = "lenient_int")]
    pub job_group_id: i32,
    #[serde(rename(deserialize = "sectorid"), deserialize_with = "lenient_opt_int")]
    pub sector_id: Option<i32>,
    /// Work status code; 7 means not working.
    #[serde(rename(deserialize = "customerwork"), deserialize_with = "lenient_int")]
    pub customer_work: i32,
    #[serde(rename(deserialize = "workingyears"), deserialize_with = "lenient_int")]
    pub working_years: i32,
    #[serde(rename(deserialize = "workingmonth"), deserialize_with = "lenient_int")]
    pub working_month: i32,
    #[serde(rename(deserialize = "titlecompany"))]
    pub title_company: Option<String>,
    #[serde(rename(deserialize = "companyposition"))]
    pub company_position: Option<String>,
}

/// Work status meaning the customer is not employed.
pub const WORK_STATUS_NOT_WORKING: i32 = 7;

/// Body of the employment save call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentSaveRequest {
    pub customer_id: i64,
    pub job_id: i32,
    pub sector_id: i32,
    pub customer_work: i32,
    pub working_years: i32,
    pub working_month: i32,
    pub title_company: String,
    pub company_position: String,
}

impl EmploymentSaveRequest {
    pub fn from_section(section: &EmploymentSection) -> Self {
        Self {
            customer_id: section.subject_id,
            job_id: section.job_group_id,
            sector_id: section.sector_id.unwrap_or_default(),
            customer_work: section.customer_work,
            working_years: section.working_years,
            working_month: section.working_month,
            title_company: section.title_company.clone().unwrap_or_default(),
            company_position: section.company_position.clone().unwrap_or_default(),
        }
    }
}

/// Income (finance assets) section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct IncomeSection {
    #[serde(
        rename(serialize = "customerId", deserialize = "customerid"),
        deserialize_with = "lenient_int"
    )]
    pub subject_id: i64,
    #[serde(rename(deserialize = "salaryamount"), with = "crate::money")]
    pub salary_amount: BigDecimal,
    #[serde(rename(deserialize = "salarybank"))]
    pub salary_bank: Option<String>,
    #[serde(rename(deserialize = "worksector"), deserialize_with = "lenient_int")]
    pub work_sector: i32,
    #[serde(rename(deserialize = "carstatus"), deserialize_with = "null_as_default")]
    pub car_status: bool,
    #[serde(rename(deserialize = "housestatus"), deserialize_with = "null_as_default")]
    pub house_status: bool,
    #[serde(rename(deserialize = "jobgroupname"))]
    pub job_group_name: Option<String>,
}

/// Marital status and spouse finances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct SpouseSection {
    #[serde(
        rename(serialize = "customerId", deserialize = "customerid"),
        deserialize_with = "lenient_int"
    )]
    pub subject_id: i64,
    #[serde(rename(deserialize = "maritalstatus"), deserialize_with = "null_as_default")]
    pub marital_status: bool,
    #[serde(rename(deserialize = "workwife"), deserialize_with = "null_as_default")]
    pub work_wife: bool,
    #[serde(rename(deserialize = "wifesalaryamount"), with = "crate::money")]
    pub wife_salary_amount: BigDecimal,
}

// ============ Reports ============

/// Lifecycle status of a credit report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ReportStatus {
    Pending,
    Approved,
    Rejected,
    #[default]
    Unknown,
}

impl ReportStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ReportStatus::Pending,
            1 => ReportStatus::Approved,
            2 => ReportStatus::Rejected,
            _ => ReportStatus::Unknown,
        }
    }

    /// Label shown next to the report.
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "Bekliyor",
            ReportStatus::Approved => "Onaylandı",
            ReportStatus::Rejected => "Reddedildi",
            ReportStatus::Unknown => "Bilinmiyor",
        }
    }
}

impl<'de> Deserialize<'de> for ReportStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Unreadable codes read as Unknown so one odd row cannot sink a list.
        let code = Option::<NumberOrText>::deserialize(deserializer)?
            .and_then(|raw| raw.to_i64().ok().flatten());
        Ok(code.map(ReportStatus::from_code).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ReportSummary {
    #[serde(rename(deserialize = "reportid"), deserialize_with = "lenient_int")]
    pub report_id: i64,
    #[serde(rename(deserialize = "reportnumber"), deserialize_with = "null_as_default")]
    pub report_number: String,
    #[serde(rename(deserialize = "reportname"), deserialize_with = "null_as_default")]
    pub report_name: String,
    #[serde(rename(deserialize = "reportdate"), deserialize_with = "lenient_timestamp")]
    pub report_date: Option<DateTime<Utc>>,
    pub status: ReportStatus,
    #[serde(rename(deserialize = "loanamount"), with = "crate::money")]
    pub loan_amount: BigDecimal,
    #[serde(deserialize_with = "lenient_int")]
    pub term: i32,
}

impl ReportSummary {
    pub fn status_text(&self) -> &'static str {
        self.status.label()
    }
}

/// One month of a credit line's payment record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct DelinquencyRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub period: String,
    #[serde(rename(deserialize = "dayspastdue"), deserialize_with = "lenient_int")]
    pub days_past_due: i32,
}

/// A credit facility listed in a detailed report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct CreditLine {
    #[serde(deserialize_with = "null_as_default")]
    pub institution: String,
    #[serde(rename(deserialize = "credittype"), deserialize_with = "null_as_default")]
    pub credit_type: String,
    #[serde(rename(deserialize = "creditlimit"), with = "crate::money")]
    pub credit_limit: BigDecimal,
    #[serde(with = "crate::money")]
    pub balance: BigDecimal,
    #[serde(rename(deserialize = "overduebalance"), with = "crate::money")]
    pub overdue_balance: BigDecimal,
    #[serde(
        rename(deserialize = "delinquencyhistory"),
        deserialize_with = "null_as_default"
    )]
    pub delinquency_history: Vec<DelinquencyRecord>,
}

impl CreditLine {
    pub fn worst_delinquency_days(&self) -> i32 {
        self.delinquency_history
            .iter()
            .map(|r| r.days_past_due)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all(serialize = "camelCase"))]
pub struct ReportDetail {
    #[serde(rename(deserialize = "reportid"), deserialize_with = "lenient_int")]
    pub report_id: i64,
    #[serde(rename(deserialize = "reportnumber"), deserialize_with = "null_as_default")]
    pub report_number: String,
    #[serde(rename(deserialize = "reporttitle"), deserialize_with = "null_as_default")]
    pub report_title: String,
    #[serde(rename(deserialize = "reportdate"), deserialize_with = "lenient_timestamp")]
    pub report_date: Option<DateTime<Utc>>,
    pub status: ReportStatus,
    #[serde(rename(deserialize = "loanamount"), with = "crate::money")]
    pub loan_amount: BigDecimal,
    #[serde(deserialize_with = "lenient_int")]
    pub term: i32,
    #[serde(rename(deserialize = "monthlypayment"), with = "crate::money")]
    pub monthly_payment: BigDecimal,
    #[serde(rename(deserialize = "totalpayment"), with = "crate::money")]
    pub total_payment: BigDecimal,
    #[serde(rename(deserialize = "totalinterest"), with = "crate::money")]
    pub total_interest: BigDecimal,
    #[serde(rename(deserialize = "interestrate"), with = "crate::money")]
    pub interest_rate: BigDecimal,
    pub content: Option<String>,
    #[serde(rename(deserialize = "additionalinfo"), deserialize_with = "null_as_default")]
    pub additional_info: BTreeMap<String, String>,
    #[serde(rename(deserialize = "creditlines"), deserialize_with = "null_as_default")]
    pub credit_lines: Vec<CreditLine>,
}

// ============ Geography ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SubRegion {
    #[serde(deserialize_with = "lenient_int")]
    pub id: i32,
    pub name: String,
    #[serde(
        rename(deserialize = "provinceid"),
        default,
        deserialize_with = "lenient_int"
    )]
    pub region_id: i32,
}

// ============ Market data ============

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CurrencyMeta {
    pub base: Option<String>,
    pub source: Option<String>,
    pub generated_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Exchange rates keyed by pair code (`USDTRY`, `TRYUSD`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRates {
    pub base: String,
    #[serde(serialize_with = "serialize_rate_map")]
    pub rates: BTreeMap<String, BigDecimal>,
    pub meta: Option<CurrencyMeta>,
}

fn serialize_rate_map<S>(rates: &BTreeMap<String, BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    struct Rate<'a>(&'a BigDecimal);
    impl Serialize for Rate<'_> {
        fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            crate::money::serialize(self.0, s)
        }
    }
    let mut map = serializer.serialize_map(Some(rates.len()))?;
    for (pair, rate) in rates {
        map.serialize_entry(pair, &Rate(rate))?;
    }
    map.end()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoQuote {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub convert: String,
    #[serde(with = "crate::money")]
    pub price: BigDecimal,
    #[serde(with = "optional_money")]
    pub percent_change_24h: Option<BigDecimal>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CryptoPrices {
    pub quotes: Vec<CryptoQuote>,
}

mod optional_money {
    use bigdecimal::BigDecimal;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<BigDecimal>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => crate::money::serialize(v, s),
            None => s.serialize_none(),
        }
    }
}

// ============ Browser JSON ============

/// `{ success, message?, value?/data? }` answered by the JSON endpoints.
///
/// Market data travels under `data`, everything else under `value`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiReply<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiReply<T> {
    pub fn value(value: T) -> Self {
        Self {
            success: true,
            message: None,
            value: Some(value),
            data: None,
        }
    }

    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            value: None,
            data: Some(data),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            value: None,
            data: None,
        }
    }
}

// ============ Reference lookups ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupItem {
    pub id: i32,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn display_name_joins_parts() {
        let identity = Identity {
            name: Some("Ada".into()),
            surname: Some("Lovelace".into()),
            ..Default::default()
        };
        assert_eq!(identity.display_name(), "Ada Lovelace");
        assert_eq!(Identity::default().display_name(), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn report_status_codes() {
        assert_eq!(ReportStatus::from_code(0), ReportStatus::Pending);
        assert_eq!(ReportStatus::from_code(1), ReportStatus::Approved);
        assert_eq!(ReportStatus::from_code(2), ReportStatus::Rejected);
        assert_eq!(ReportStatus::from_code(9), ReportStatus::Unknown);
        assert_eq!(ReportStatus::Approved.label(), "Onaylandı");
    }

    #[test]
    fn numeric_strings_are_read_as_ids() {
        let identity: Identity =
            serde_json::from_str(r#"{"customerid":" 7 ","name":"Ada"}"#).unwrap();
        assert_eq!(identity.subject_id, 7);
        assert_eq!(identity.name.as_deref(), Some("Ada"));

        let blank: Identity = serde_json::from_str(r#"{"customerid":""}"#).unwrap();
        assert_eq!(blank.subject_id, 0);

        assert!(serde_json::from_str::<Identity>(r#"{"customerid":"yedi"}"#).is_err());
        assert!(serde_json::from_str::<Identity>(r#"{"customerid":7.5}"#).is_err());
    }

    #[test]
    fn report_status_accepts_text_codes() {
        let report: ReportSummary =
            serde_json::from_str(r#"{"reportid":"3","status":"1","term":"12"}"#).unwrap();
        assert_eq!(report.report_id, 3);
        assert_eq!(report.status, ReportStatus::Approved);
        assert_eq!(report.term, 12);

        let odd: ReportSummary = serde_json::from_str(r#"{"status":"onaylandı"}"#).unwrap();
        assert_eq!(odd.status, ReportStatus::Unknown);
    }

    #[test]
    fn address_line_keys_merge_preferring_current_key() {
        let both: AddressSection = serde_json::from_str(
            r#"{"customerid":"7","cityid":"34","address":"Moda Cad. 12","addressline":"Eski"}"#,
        )
        .unwrap();
        assert_eq!(both.subject_id, 7);
        assert_eq!(both.city_id, Some(34));
        assert_eq!(both.address.as_deref(), Some("Moda Cad. 12"));

        let legacy: AddressSection =
            serde_json::from_str(r#"{"address":" ","addressline":"Bağdat Cad. 3"}"#).unwrap();
        assert_eq!(legacy.address.as_deref(), Some("Bağdat Cad. 3"));
    }

    #[test]
    fn timestamps_without_zone_are_utc() {
        let parsed = parse_timestamp("2024-05-01T10:00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(parse_timestamp("2024-05-01T10:00:00.123Z").is_some());
        assert!(parse_timestamp("dün").is_none());
    }

    #[test]
    fn income_section_serializes_camel_case_with_exact_amount() {
        let section = IncomeSection {
            subject_id: 7,
            salary_amount: BigDecimal::from_str("12345.67").unwrap(),
            salary_bank: Some("Akbank".into()),
            work_sector: 3,
            car_status: true,
            house_status: false,
            job_group_name: None,
        };
        let json = serde_json::to_string(&section).unwrap();
        assert!(json.contains(r#""customerId":7"#));
        assert!(json.contains(r#""salaryAmount":12345.67"#));
        assert!(json.contains(r#""carStatus":true"#));
    }

    #[test]
    fn worst_delinquency_is_max_days() {
        let line = CreditLine {
            delinquency_history: vec![
                DelinquencyRecord {
                    period: "2024-01".into(),
                    days_past_due: 0,
                },
                DelinquencyRecord {
                    period: "2024-02".into(),
                    days_past_due: 45,
                },
            ],
            ..Default::default()
        };
        assert_eq!(line.worst_delinquency_days(), 45);
    }
}
