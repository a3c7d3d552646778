//! Arbitrary-precision number handling
//!
//! Block numbers and wei amounts are kept as [`BigUint`] end to end. Nodes
//! encode quantities as `0x`-prefixed hex, while user input arrives as decimal,
//! so parsing detects the base from the prefix.

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serializer};

/// Parse an unsigned integer, picking the base from its prefix.
///
/// `0x` is hex, `0o` octal, `0b` binary, a bare leading `0` followed by more
/// digits is octal, anything else decimal. A leading `+` is allowed and single
/// underscores may separate digits, or follow a base prefix. Surrounding
/// whitespace and negative numbers are rejected.
pub fn parse_big_uint(input: &str) -> Option<BigUint> {
    let s = input.strip_prefix('+').unwrap_or(input);

    let (radix, digits) = if let Some(rest) = strip_prefix_ci(s, "0x") {
        (16, rest)
    } else if let Some(rest) = strip_prefix_ci(s, "0o") {
        (8, rest)
    } else if let Some(rest) = strip_prefix_ci(s, "0b") {
        (2, rest)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        return parse_digits(s, 10);
    };

    // "0x_ff" is fine, "_ff" is not
    parse_digits(digits.strip_prefix('_').unwrap_or(digits), radix)
}

/// Parse the externally supplied block selection. Decimal only, with an
/// optional leading `+`; anything else means "no selection".
pub fn parse_block_selection(input: Option<&str>) -> Option<BigUint> {
    let raw = input?;
    let s = raw.strip_prefix('+').unwrap_or(raw);
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(s.as_bytes(), 10)
}

/// Encode a quantity the way nodes expect it in request params.
pub fn to_quantity(value: &BigUint) -> String {
    format!("0x{}", value.to_str_radix(16))
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => s.get(prefix.len()..),
        _ => None,
    }
}

fn parse_digits(digits: &str, radix: u32) -> Option<BigUint> {
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return None;
    }
    if digits.contains("__") {
        return None;
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if !cleaned.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    BigUint::parse_bytes(cleaned.as_bytes(), radix)
}

/// Serialize a `BigUint` as a decimal string so JSON consumers never lose precision.
pub fn serialize_decimal<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_str_radix(10))
}

pub fn serialize_opt_decimal<S: Serializer>(
    value: &Option<BigUint>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&v.to_str_radix(10)),
        None => serializer.serialize_none(),
    }
}

/// Deserialize a node quantity (`"0x1b4"`) into a `BigUint`.
pub fn deserialize_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_big_uint(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity {:?}", raw)))
}

pub fn deserialize_opt_quantity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<BigUint>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_big_uint(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid quantity {:?}", raw))),
        None => Ok(None),
    }
}
