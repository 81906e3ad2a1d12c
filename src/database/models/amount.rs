// Amounts are stored as plain JSON numbers so snapshots written by older
// clients stay readable. Reading is lenient: anything that is not a number
// (missing, null, "", "abc", true) counts as zero.
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;
use std::str::FromStr;

pub fn serialize<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value.to_i64() {
        Some(whole) if value.fract().is_zero() => serializer.serialize_i64(whole),
        _ => serializer.serialize_f64(value.to_f64().unwrap_or(0.0)),
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map(coerce).unwrap_or(Decimal::ZERO))
}

/// Numeric coercion used everywhere an amount enters the system.
pub fn coerce(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                n.as_f64().and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO)
            }
        }
        Value::String(s) => parse_lenient(s),
        _ => Decimal::ZERO,
    }
}

/// Parses user input the way a number field does: blank or garbage is zero.
pub fn parse_lenient(s: &str) -> Decimal {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}
