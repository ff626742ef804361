//! Exact decimal serde for monetary fields.
//!
//! Amounts are written to the wire as JSON numbers carrying the decimal's own
//! text (no detour through `f64`). On the way in, strings and integers are
//! parsed directly; JSON floats are re-read from their shortest round-trip
//! text, which restores the literal the upstream sent.
//!
//! Use with `#[serde(with = "crate::money", default)]` on `BigDecimal` fields.

use bigdecimal::{BigDecimal, Zero};
use serde::de::{self, Visitor};
use serde::{Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub fn serialize<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let raw = serde_json::value::RawValue::from_string(value.to_string())
        .map_err(serde::ser::Error::custom)?;
    raw.serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(MoneyVisitor)
}

/// Parses user or upstream text into a decimal. Accepts a comma decimal separator.
pub fn parse(text: &str) -> Option<BigDecimal> {
    let cleaned = text.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    BigDecimal::from_str(&cleaned).ok()
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = BigDecimal;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal amount as number or string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(BigDecimal::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() {
            return Err(E::custom("amount is not a finite number"));
        }
        // Display on f64 yields the shortest text that reads back to the same value
        BigDecimal::from_str(&v.to_string()).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        if v.trim().is_empty() {
            return Ok(BigDecimal::zero());
        }
        parse(v).ok_or_else(|| E::custom(format!("invalid decimal amount: {}", v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BigDecimal::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(BigDecimal::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize)]
    struct Amount {
        #[serde(with = "crate::money", default)]
        value: BigDecimal,
    }

    #[test]
    fn float_literal_is_read_exactly() {
        let amount: Amount = serde_json::from_str(r#"{"value": 12345.67}"#).unwrap();
        assert_eq!(amount.value, BigDecimal::from_str("12345.67").unwrap());
    }

    #[test]
    fn string_and_integer_forms_are_accepted() {
        let a: Amount = serde_json::from_str(r#"{"value": "0.10"}"#).unwrap();
        let b: Amount = serde_json::from_str(r#"{"value": 250}"#).unwrap();
        assert_eq!(a.value, BigDecimal::from_str("0.1").unwrap());
        assert_eq!(b.value, BigDecimal::from(250));
    }

    #[test]
    fn null_and_missing_become_zero() {
        let a: Amount = serde_json::from_str(r#"{"value": null}"#).unwrap();
        let b: Amount = serde_json::from_str(r#"{}"#).unwrap();
        assert!(a.value.is_zero());
        assert!(b.value.is_zero());
    }

    #[test]
    fn serialized_text_is_the_decimal_itself() {
        let amount = Amount {
            value: BigDecimal::from_str("12345.67").unwrap(),
        };
        assert_eq!(serde_json::to_string(&amount).unwrap(), r#"{"value":12345.67}"#);
    }

    #[test]
    fn comma_separator_is_accepted_by_parse() {
        assert_eq!(parse("1500,50"), BigDecimal::from_str("1500.50").ok());
        assert_eq!(parse("  "), None);
        assert_eq!(parse("abc"), None);
    }
}
