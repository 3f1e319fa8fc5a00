//! Arbitrary precision integers as bare JSON numbers.
//!
//! Coordinates and scalars travel as decimal integer literals such as
//! `{"x": 5506626302227734366957871889516853432625...}`. This relies on the
//! `arbitrary_precision` feature of `serde_json`, which keeps the literal
//! text of a number instead of forcing it through `f64`.

use std::str::FromStr;

use num_bigint::BigUint;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;

pub fn serialize<S>(n: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let number = Number::from_str(&n.to_str_radix(10)).map_err(S::Error::custom)?;
    number.serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    parse(&number.to_string()).map_err(D::Error::custom)
}

/// Parse a non-negative decimal integer. Signs, fractions and exponents are
/// rejected rather than rounded.
pub fn parse(literal: &str) -> Result<BigUint, String> {
    if literal.is_empty() || !literal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected a non-negative integer, got {}", literal));
    }
    BigUint::from_str(literal).map_err(|e| e.to_string())
}
