/// Property-based tests using proptest
/// Tests invariants of input normalization, masking and decoding for all inputs
use bigdecimal::BigDecimal;
use credit_portal::envelope;
use credit_portal::models::Identity;
use credit_portal::money;
use credit_portal::obs::{display_phone, mask_national_id, mask_phone};
use credit_portal::token::subject_id_from_token;
use credit_portal::validation::{normalize_phone, validate_national_id, validate_phone};
use proptest::prelude::*;
use std::str::FromStr;

// Property: validators never panic and accept exactly the documented shapes
proptest! {
    #[test]
    fn validators_never_panic(input in "\\PC*") {
        let _ = validate_national_id(&input);
        let _ = validate_phone(&input);
    }

    #[test]
    fn eleven_digits_are_a_valid_national_id(national_id in "[0-9]{11}") {
        prop_assert!(validate_national_id(&national_id).is_ok());
    }

    #[test]
    fn other_lengths_are_rejected(national_id in "[0-9]{1,10}|[0-9]{12,15}") {
        prop_assert!(validate_national_id(&national_id).is_err());
    }

    #[test]
    fn formatted_mobile_numbers_normalize_and_validate(
        a in "5[0-9]{2}",
        b in "[0-9]{3}",
        c in "[0-9]{2}",
        d in "[0-9]{2}"
    ) {
        let typed = format!("({}) {}-{} {}", a, b, c, d);
        let normalized = normalize_phone(&typed);
        prop_assert_eq!(normalized.len(), 10);
        prop_assert!(validate_phone(&typed).is_ok());
    }
}

// Property: masking never reveals the hidden middle
proptest! {
    #[test]
    fn masked_national_id_keeps_only_edges(national_id in "[0-9]{11}") {
        let masked = mask_national_id(&national_id);
        prop_assert_eq!(masked.len(), 11);
        prop_assert_eq!(&masked[1..9], "********");
        prop_assert_eq!(&masked[..1], &national_id[..1]);
        prop_assert_eq!(&masked[9..], &national_id[9..]);
    }

    #[test]
    fn masked_phone_hides_middle_digits(phone in "5[0-9]{9}") {
        let masked = mask_phone(&phone);
        prop_assert_eq!(&masked[3..7], "****");
        prop_assert_eq!(&masked[..3], &phone[..3]);
    }

    #[test]
    fn display_phone_only_adds_spaces(phone in "5[0-9]{9}") {
        let shown = display_phone(&phone).unwrap();
        prop_assert_eq!(shown.replace(' ', ""), phone);
    }
}

// Property: amounts parse exactly, with either decimal separator
proptest! {
    #[test]
    fn amounts_parse_exactly(units in 0u64..1_000_000_000, cents in 0u32..100) {
        let dotted = format!("{}.{:02}", units, cents);
        let comma = format!("{},{:02}", units, cents);
        let expected = BigDecimal::from_str(&dotted).unwrap();
        prop_assert_eq!(money::parse(&dotted), Some(expected.clone()));
        prop_assert_eq!(money::parse(&comma), Some(expected));
    }
}

// Property: token parsing never panics and malformed tokens yield 0
proptest! {
    #[test]
    fn token_parsing_never_panics(token in "\\PC*") {
        let _ = subject_id_from_token(&token);
    }

    #[test]
    fn tokens_without_three_parts_yield_zero(token in "[A-Za-z0-9_-]{0,40}(\\.[A-Za-z0-9_-]{1,20})?") {
        prop_assert_eq!(subject_id_from_token(&token), 0);
    }
}

// Property: key casing, enveloping and numeric text do not change the decoded value
proptest! {
    #[test]
    fn identity_decoding_ignores_case_and_envelope(
        subject_id in 1i64..1_000_000,
        name in "[A-Za-z]{1,12}",
        upper in any::<bool>(),
        wrapped in any::<bool>(),
        id_as_text in any::<bool>()
    ) {
        let (id_key, name_key) = if upper { ("CUSTOMERID", "NAME") } else { ("customerId", "name") };
        let mut fields = serde_json::Map::new();
        let id: serde_json::Value = if id_as_text {
            subject_id.to_string().into()
        } else {
            subject_id.into()
        };
        fields.insert(id_key.to_string(), id);
        fields.insert(name_key.to_string(), name.clone().into());
        let inner = serde_json::Value::Object(fields);
        let body = if wrapped {
            serde_json::json!({ "Value": inner })
        } else {
            inner
        };

        let identity: Identity = envelope::decode(&body.to_string()).unwrap();
        prop_assert_eq!(identity.subject_id, subject_id);
        prop_assert_eq!(identity.name, Some(name));
    }
}
