/// Gateway client tests against mocked upstream APIs
/// Every upstream is pointed at one wiremock server
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bigdecimal::BigDecimal;
use chrono::{Duration as ChronoDuration, Utc};
use credit_portal::config::Config;
use credit_portal::errors::GatewayError;
use credit_portal::gateway_client::ApiGatewayClient;
use credit_portal::models::{AddressSection, ReportStatus, SpouseSection};
use serde_json::json;
use std::str::FromStr;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiGatewayClient {
    ApiGatewayClient::new(&Config::for_single_upstream(&server.uri())).unwrap()
}

fn token_with(claims: serde_json::Value) -> String {
    format!(
        "{}.{}.signature",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

// ============ Identity & OTP ============

#[tokio::test]
async fn test_identity_reads_wrapped_and_bare_bodies_alike() {
    for body in [
        json!({ "value": { "CustomerId": 7, "Name": "Ada", "Surname": "Yılmaz" } }),
        json!({ "customerId": 7, "NAME": "Ada", "surname": "Yılmaz" }),
    ] {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/customer/tckn-gsm"))
            .and(body_partial_json(json!({ "TCKN": "12345678901", "GSM": "5321234567" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let identity = client_for(&mock_server)
            .verify_identity("12345678901", "5321234567")
            .await
            .unwrap();

        assert_eq!(identity.subject_id, 7);
        assert_eq!(identity.display_name(), "Ada Yılmaz");
    }
}

#[tokio::test]
async fn test_identity_accepts_numeric_string_subject_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customer/tckn-gsm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "CustomerId": "7", "Name": "Ada" }
        })))
        .mount(&mock_server)
        .await;

    let identity = client_for(&mock_server)
        .verify_identity("12345678901", "5321234567")
        .await
        .unwrap();

    assert_eq!(identity.subject_id, 7);
    assert_eq!(identity.name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_unreadable_wrapped_identity_is_an_error_not_an_empty_record() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customer/tckn-gsm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "CustomerId": "yedi", "Name": "Ada" }
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .verify_identity("12345678901", "5321234567")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Unexpected(_)));
}

#[tokio::test]
async fn test_identity_rejection_carries_upstream_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customer/tckn-gsm"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "Message": "TCKN ve GSM eşleşmedi." })),
        )
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .verify_identity("12345678901", "5321234567")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::ValidationFailed("TCKN ve GSM eşleşmedi.".to_string())
    );
}

#[tokio::test]
async fn test_otp_fields_are_translated_with_expiry_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-otp"))
        .and(body_partial_json(json!({ "tckn": "12345678901", "gsm": "5321234567", "utmId": "5" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Value": { "OTPCode": "123456", "RetryCount": 2 } })),
        )
        .mount(&mock_server)
        .await;

    let before = Utc::now();
    let code = client_for(&mock_server)
        .request_otp("12345678901", "5321234567")
        .await
        .unwrap();

    assert_eq!(code.otp_code, "123456");
    assert_eq!(code.retry_count, 2);
    assert!(code.expires_at >= before + ChronoDuration::minutes(4));
    assert!(code.expires_at <= Utc::now() + ChronoDuration::minutes(6));
}

#[tokio::test]
async fn test_otp_without_code_is_unexpected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "retryCount": 0 })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .request_otp("12345678901", "5321234567")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Unexpected(_)));
}

#[tokio::test]
async fn test_verify_otp_recovers_subject_from_token() {
    let mock_server = MockServer::start().await;
    let token = token_with(json!({ "customerId": 42, "exp": 1900000000 }));
    Mock::given(method("POST"))
        .and(path("/api/verify-otp"))
        .and(body_partial_json(json!({ "otpCode": "654321" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Token": token })))
        .mount(&mock_server)
        .await;

    let grant = client_for(&mock_server).verify_otp("654321").await.unwrap();

    assert_eq!(grant.subject_id, 42);
    assert_eq!(grant.token, token);
    assert!(grant.expires_at > Utc::now() + ChronoDuration::hours(23));
}

#[tokio::test]
async fn test_verify_otp_prefers_body_subject() {
    let mock_server = MockServer::start().await;
    let token = token_with(json!({ "customerId": 42 }));
    Mock::given(method("POST"))
        .and(path("/api/verify-otp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": { "token": token, "customerId": 9 } })),
        )
        .mount(&mock_server)
        .await;

    let grant = client_for(&mock_server).verify_otp("654321").await.unwrap();
    assert_eq!(grant.subject_id, 9);
}

#[tokio::test]
async fn test_requests_carry_bearer_and_access_code() {
    let mock_server = MockServer::start().await;
    let mut config = Config::for_single_upstream(&mock_server.uri());
    config.access_codes.send_otp_sms = Some("sms-code".to_string());

    Mock::given(method("POST"))
        .and(path("/api/send-otp-sms"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("code", "sms-code"))
        .and(body_partial_json(json!({ "gsm": "5321234567", "otpCode": "123456" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiGatewayClient::new(&config).unwrap();
    client.send_otp_sms("5321234567", "123456").await.unwrap();
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let mock_server = MockServer::start().await;
    let mut config = Config::for_single_upstream(&mock_server.uri());
    config.upstream_timeout_secs = 1;

    Mock::given(method("POST"))
        .and(path("/api/customer/tckn-gsm"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "customerId": 7 }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let client = ApiGatewayClient::new(&config).unwrap();
    let err = client
        .verify_identity("12345678901", "5321234567")
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::Timeout);
}

// ============ Disclosure ============

#[tokio::test]
async fn test_disclosure_text_falls_back_to_raw_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/kvkk/text/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Text": "Aydınlatma metni" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/kvkk/text/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Düz metin</p>"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.get_disclosure_text(1).await.unwrap(), "Aydınlatma metni");
    assert_eq!(client.get_disclosure_text(2).await.unwrap(), "<p>Düz metin</p>");
}

#[tokio::test]
async fn test_disclosure_json_without_text_field() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/kvkk/text/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "Aydınlatma metni" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/kvkk/text/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Value": { "Text": "Açık rıza" } })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/kvkk/text/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Id": 3, "Title": "KVKK" })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.get_disclosure_text(1).await.unwrap(), "Aydınlatma metni");
    assert_eq!(client.get_disclosure_text(2).await.unwrap(), "Açık rıza");
    assert_eq!(client.get_disclosure_text(3).await.unwrap(), "");
}

// ============ Profile sections ============

#[tokio::test]
async fn test_missing_section_reads_as_empty() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/address/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/customer/wife-info/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let address = client.get_address(9).await.unwrap();
    assert_eq!(address, AddressSection::empty(9));
    assert!(client.get_spouse(9).await.unwrap().is_none());
}

#[tokio::test]
async fn test_address_fields_are_read_case_insensitively() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/address/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Value": { "CityId": 34, "TownId": 3401, "Adress": "Moda Cd. No:5", "PostalCode": "34710" }
        })))
        .mount(&mock_server)
        .await;

    let address = client_for(&mock_server).get_address(9).await.unwrap();
    assert_eq!(address.subject_id, 9);
    assert_eq!(address.city_id, Some(34));
    assert_eq!(address.town_id, Some(3401));
    assert_eq!(address.address.as_deref(), Some("Moda Cd. No:5"));
    assert_eq!(address.postal_code.as_deref(), Some("34710"));
}

#[tokio::test]
async fn test_address_with_current_and_legacy_line_keys() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/address/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "CustomerId": 7,
                "CityId": 34,
                "TownId": 3401,
                "Address": "Moda Cad. 12",
                "AddressLine": "Moda Cad. 12"
            }
        })))
        .mount(&mock_server)
        .await;

    let address = client_for(&mock_server).get_address(7).await.unwrap();
    assert_eq!(address.subject_id, 7);
    assert_eq!(address.city_id, Some(34));
    assert_eq!(address.town_id, Some(3401));
    assert_eq!(address.address.as_deref(), Some("Moda Cad. 12"));
    assert!(address.has_address_line());
}

#[tokio::test]
async fn test_save_without_success_flag_counts_as_saved() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customer/address"))
        .and(body_partial_json(json!({
            "customerId": 9, "adress": "Moda Cd. No:5", "cityId": 34, "townId": 3401, "source": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let section = AddressSection {
        subject_id: 9,
        city_id: Some(34),
        town_id: Some(3401),
        address: Some("Moda Cd. No:5".to_string()),
        ..Default::default()
    };
    client_for(&mock_server).save_address(&section).await.unwrap();
}

#[tokio::test]
async fn test_explicit_save_failure_surfaces_message() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customer/address"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Success": false, "Message": "Adres doğrulanamadı." })),
        )
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .save_address(&AddressSection::empty(9))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::ValidationFailed("Adres doğrulanamadı.".to_string())
    );
}

#[tokio::test]
async fn test_income_amount_survives_read_and_write_exactly() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/finance-assets/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "SalaryAmount": 12345.67,
                "SalaryBank": "Akbank",
                "WorkSector": 3,
                "CarStatus": true,
                "HouseStatus": null
            }
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/customer/finance-assets"))
        .and(body_partial_json(json!({ "customerId": 5, "salaryAmount": 12345.67 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let income = client.get_income(5).await.unwrap();

    assert_eq!(income.salary_amount, BigDecimal::from_str("12345.67").unwrap());
    assert_eq!(income.salary_bank.as_deref(), Some("Akbank"));
    assert!(income.car_status);
    assert!(!income.house_status);

    let written = serde_json::to_string(&income).unwrap();
    assert!(written.contains("\"salaryAmount\":12345.67"));

    client.save_income(&income).await.unwrap();
}

#[tokio::test]
async fn test_spouse_salary_zeroed_when_spouse_not_working() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/customer/wife-info/5"))
        .and(body_partial_json(json!({
            "customerId": 5, "maritalStatus": true, "workWife": false, "wifeSalaryAmount": 0
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let section = SpouseSection {
        subject_id: 5,
        marital_status: true,
        work_wife: false,
        wife_salary_amount: BigDecimal::from(40000),
    };
    client_for(&mock_server).save_spouse(&section).await.unwrap();
}

// ============ Reports ============

#[tokio::test]
async fn test_reports_are_sorted_newest_first() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/report-list/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ReportId": 1, "ReportName": "Eski", "ReportDate": "2024-01-10T09:00:00", "Status": 1 },
            { "ReportId": 2, "ReportName": "Yeni", "ReportDate": "2024-06-01T09:00:00Z", "Status": 2 }
        ])))
        .mount(&mock_server)
        .await;

    let reports = client_for(&mock_server).get_reports(5).await.unwrap();
    let ids: Vec<i64> = reports.iter().map(|r| r.report_id).collect();
    assert_eq!(ids, vec![2, 1]);
}

#[tokio::test]
async fn test_reports_accept_text_typed_ids_and_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/report-list/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "ReportId": 1, "Status": "1", "LoanAmount": 1000 },
            { "ReportId": "2", "Status": "beklemede", "Term": "24" }
        ])))
        .mount(&mock_server)
        .await;

    let reports = client_for(&mock_server).get_reports(5).await.unwrap();
    assert_eq!(reports.len(), 2);
    let first = reports.iter().find(|r| r.report_id == 1).unwrap();
    assert_eq!(first.status, ReportStatus::Approved);
    let second = reports.iter().find(|r| r.report_id == 2).unwrap();
    assert_eq!(second.status, ReportStatus::Unknown);
    assert_eq!(second.term, 24);
}

#[tokio::test]
async fn test_no_reports_upstream_is_an_empty_list() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/report-list/5"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    assert!(client_for(&mock_server).get_reports(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_report_detail_guards_and_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/report-detail/77"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert!(matches!(
        client.get_report_detail(0).await,
        Err(GatewayError::ValidationFailed(_))
    ));
    assert_eq!(
        client.get_report_detail(77).await.unwrap_err(),
        GatewayError::NotFound
    );
}

#[tokio::test]
async fn test_report_detail_keeps_additional_info_keys() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/customer/report-detail/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "ReportTitle": "Kredi Raporu",
                "LoanAmount": "150000.00",
                "AdditionalInfo": { "Kredi Notu": "1450" },
                "CreditLines": [
                    { "Institution": "Akbank", "DelinquencyHistory": [
                        { "Period": "2024-01", "DaysPastDue": 0 },
                        { "Period": "2024-02", "DaysPastDue": 30 }
                    ]}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let detail = client_for(&mock_server).get_report_detail(3).await.unwrap();
    assert_eq!(detail.report_id, 3);
    assert_eq!(detail.loan_amount, BigDecimal::from_str("150000.00").unwrap());
    assert_eq!(
        detail.additional_info.get("Kredi Notu").map(String::as_str),
        Some("1450")
    );
    assert_eq!(detail.credit_lines[0].worst_delinquency_days(), 30);
}

// ============ Geography ============

#[tokio::test]
async fn test_regions_from_geography_api() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/provinces"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "data": [ { "id": 6, "name": "Ankara" }, { "id": 34, "name": "İstanbul" } ]
        })))
        .mount(&mock_server)
        .await;

    let regions = client_for(&mock_server).get_regions().await;
    assert_eq!(regions.len(), 2);
    assert_eq!(regions[1].name, "İstanbul");
}

#[tokio::test]
async fn test_regions_fall_back_when_api_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/provinces"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let regions = client_for(&mock_server).get_regions().await;
    assert_eq!(regions.len(), 81);
}

#[tokio::test]
async fn test_empty_district_list_falls_back_to_static_table() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/districts"))
        .and(query_param("provinceId", "34"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&mock_server)
        .await;

    let districts = client_for(&mock_server).get_sub_regions(34).await;
    assert_eq!(districts.len(), 34);
    assert!(districts.iter().all(|d| d.region_id == 34));
}

#[tokio::test]
async fn test_remote_districts_get_their_region_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/districts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Çankaya" }
        ])))
        .mount(&mock_server)
        .await;

    let districts = client_for(&mock_server).get_sub_regions(6).await;
    assert_eq!(districts.len(), 1);
    assert_eq!(districts[0].region_id, 6);
}

// ============ Market data ============

#[tokio::test]
async fn test_currency_rates_are_exact_decimals() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/usd.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "USDTRY": "34.1234",
            "USDEUR": 0.92,
            "broken": null,
            "_meta": { "base": "USD", "source": "TCMB" }
        })))
        .mount(&mock_server)
        .await;

    let rates = client_for(&mock_server).get_currency_rates("USD").await.unwrap();
    assert_eq!(rates.base, "USD");
    assert_eq!(rates.rates.len(), 2);
    assert_eq!(
        rates.rates.get("USDTRY"),
        Some(&BigDecimal::from_str("34.1234").unwrap())
    );
}

#[tokio::test]
async fn test_currency_without_rates_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/try.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_meta": {} })))
        .mount(&mock_server)
        .await;

    assert!(client_for(&mock_server).get_currency_rates("TRY").await.is_err());
}

#[tokio::test]
async fn test_crypto_quotes_are_read() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/cryptocurrency/quotes/latest"))
        .and(query_param("symbol", "BTC,ETH"))
        .and(query_param("convert", "TRY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "error_code": 0 },
            "data": {
                "BTC": { "id": 1, "symbol": "BTC", "name": "Bitcoin",
                         "quote": { "TRY": { "price": 2100000.5, "percent_change_24h": -1.25 } } },
                "ETH": [ { "id": 1027, "symbol": "ETH", "name": "Ethereum",
                           "quote": { "TRY": { "price": "98000.10" } } } ]
            }
        })))
        .mount(&mock_server)
        .await;

    let prices = client_for(&mock_server)
        .get_crypto_prices("BTC,ETH", "try")
        .await
        .unwrap();

    assert_eq!(prices.quotes.len(), 2);
    let eth = prices.quotes.iter().find(|q| q.symbol == "ETH").unwrap();
    assert_eq!(eth.price, BigDecimal::from_str("98000.10").unwrap());
    assert_eq!(eth.percent_change_24h, None);
}

#[tokio::test]
async fn test_crypto_status_error_is_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/cryptocurrency/quotes/latest"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": { "error_code": 1002, "error_message": "API key missing." }
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .get_crypto_prices("BTC", "TRY")
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::ValidationFailed("API key missing.".to_string()));
}
