//! The scenario value interpreter.
//!
//! Scenario files write byte strings in several human-friendly forms; all of
//! them decode to plain bytes:
//!
//! * `"0x…"` — hexadecimal
//! * `"123"` / `"-5"` — decimal, big-endian minimal bytes (two's complement
//!   for negative values)
//! * `"''text"` / ``"``text"`` / `"str:text"` — literal ASCII
//! * `"true"` / `"false"` — `0x01` / empty
//! * `"address:name"` — the name right-padded with `_` to 32 bytes
//! * `"file:relative/path"` — the raw contents of a file next to the
//!   scenario

use std::path::{Path, PathBuf};

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error::ScenarioError;

const ADDRESS_LENGTH: usize = 32;

/// Carries the scenario file's directory so `file:` values resolve
/// relative to it.
#[derive(Clone, Debug, Default)]
pub struct InterpreterContext {
    file_base_path: PathBuf,
}

impl InterpreterContext {
    /// A context resolving `file:` values against `base_path`.
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        InterpreterContext {
            file_base_path: base_path.as_ref().to_owned(),
        }
    }
}

/// Decodes one scenario string into bytes.
pub fn interpret_string(raw: &str, context: &InterpreterContext) -> Result<Vec<u8>, ScenarioError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(hex_digits) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        return hex::decode(hex_digits)
            .map_err(|error| ScenarioError::parse(format!("invalid hex value {raw}: {error}")));
    }

    if let Some(text) = raw.strip_prefix("''").or_else(|| raw.strip_prefix("``")) {
        return Ok(text.as_bytes().to_vec());
    }
    if let Some(text) = raw.strip_prefix("str:") {
        return Ok(text.as_bytes().to_vec());
    }

    if raw == "true" {
        return Ok(vec![1]);
    }
    if raw == "false" {
        return Ok(Vec::new());
    }

    if let Some(name) = raw.strip_prefix("address:") {
        let mut bytes = name.as_bytes().to_vec();
        if bytes.len() > ADDRESS_LENGTH {
            return Err(ScenarioError::parse(format!(
                "address name too long: {raw}"
            )));
        }
        bytes.resize(ADDRESS_LENGTH, b'_');
        return Ok(bytes);
    }

    if let Some(path) = raw.strip_prefix("file:") {
        let full_path = context.file_base_path.join(path);
        return std::fs::read(&full_path).map_err(|error| {
            ScenarioError::parse(format!("cannot load file {}: {error}", full_path.display()))
        });
    }

    interpret_number(raw)
}

fn interpret_number(raw: &str) -> Result<Vec<u8>, ScenarioError> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '_').collect();
    let signed: BigInt = cleaned
        .parse()
        .map_err(|_| ScenarioError::parse(format!("could not interpret value: {raw}")))?;
    match signed.sign() {
        Sign::NoSign => Ok(Vec::new()),
        Sign::Plus => Ok(signed.magnitude().to_bytes_be()),
        Sign::Minus => Ok(signed.to_signed_bytes_be()),
    }
}

/// Decodes a scenario string that must be a non-negative integer.
pub fn interpret_big_uint(
    raw: &str,
    context: &InterpreterContext,
) -> Result<BigUint, ScenarioError> {
    let bytes = interpret_string(raw, context)?;
    Ok(BigUint::from_bytes_be(&bytes))
}

/// Decodes a scenario string that must fit in a `u64`.
pub fn interpret_u64(raw: &str, context: &InterpreterContext) -> Result<u64, ScenarioError> {
    let value = interpret_big_uint(raw, context)?;
    if value.is_zero() {
        return Ok(0);
    }
    let bytes = value.to_bytes_be();
    if bytes.len() > 8 {
        return Err(ScenarioError::parse(format!(
            "value does not fit in u64: {raw}"
        )));
    }
    let mut buffer = [0u8; 8];
    buffer[8 - bytes.len()..].copy_from_slice(&bytes);
    Ok(u64::from_be_bytes(buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(raw: &str) -> Vec<u8> {
        interpret_string(raw, &InterpreterContext::default()).unwrap()
    }

    #[test]
    fn should_interpret_hex() {
        assert_eq!(interpret("0x1234"), vec![0x12, 0x34]);
        assert_eq!(interpret("0x"), Vec::<u8>::new());
    }

    #[test]
    fn should_interpret_decimal() {
        assert_eq!(interpret("0"), Vec::<u8>::new());
        assert_eq!(interpret("1"), vec![1]);
        assert_eq!(interpret("256"), vec![1, 0]);
        assert_eq!(interpret("1,000"), vec![0x03, 0xe8]);
    }

    #[test]
    fn should_interpret_negative_as_signed_bytes() {
        assert_eq!(interpret("-1"), vec![0xff]);
        assert_eq!(interpret("-256"), vec![0xff, 0x00]);
    }

    #[test]
    fn should_interpret_strings() {
        assert_eq!(interpret("''abc"), b"abc".to_vec());
        assert_eq!(interpret("``abc"), b"abc".to_vec());
        assert_eq!(interpret("str:abc"), b"abc".to_vec());
    }

    #[test]
    fn should_interpret_booleans() {
        assert_eq!(interpret("true"), vec![1]);
        assert_eq!(interpret("false"), Vec::<u8>::new());
    }

    #[test]
    fn should_pad_addresses() {
        let address = interpret("address:owner");
        assert_eq!(address.len(), 32);
        assert!(address.starts_with(b"owner"));
        assert!(address[5..].iter().all(|byte| *byte == b'_'));
    }

    #[test]
    fn should_parse_u64_bounds() {
        let context = InterpreterContext::default();
        assert_eq!(interpret_u64("100000", &context).unwrap(), 100_000);
        assert!(interpret_u64("123456789012345678901234567890", &context).is_err());
    }
}
