//! Parsed scenario values that remember their original rendering, so a
//! written-back scenario keeps the author's notation.

use num_bigint::BigUint;

use crate::{
    error::ScenarioError,
    interpret::{interpret_big_uint, interpret_string, interpret_u64, InterpreterContext},
};

/// A byte string plus the scenario notation it was parsed from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BytesValue {
    /// The decoded bytes.
    pub value: Vec<u8>,
    /// The notation found in the scenario file.
    pub original: String,
}

impl BytesValue {
    /// Parses one scenario string.
    pub fn parse(raw: &str, context: &InterpreterContext) -> Result<Self, ScenarioError> {
        Ok(BytesValue {
            value: interpret_string(raw, context)?,
            original: raw.to_owned(),
        })
    }

    /// True when no bytes were specified.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// A `u64` plus its original notation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct U64Value {
    /// The decoded number.
    pub value: u64,
    /// The notation found in the scenario file.
    pub original: String,
}

impl U64Value {
    /// Parses one scenario string or JSON number rendering.
    pub fn parse(raw: &str, context: &InterpreterContext) -> Result<Self, ScenarioError> {
        Ok(U64Value {
            value: interpret_u64(raw, context)?,
            original: raw.to_owned(),
        })
    }
}

/// An unsigned big integer plus its original notation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BigUintValue {
    /// The decoded number.
    pub value: BigUint,
    /// The notation found in the scenario file.
    pub original: String,
}

impl BigUintValue {
    /// Parses one scenario string or JSON number rendering.
    pub fn parse(raw: &str, context: &InterpreterContext) -> Result<Self, ScenarioError> {
        Ok(BigUintValue {
            value: interpret_big_uint(raw, context)?,
            original: raw.to_owned(),
        })
    }
}

/// An expected value in a check block: either a concrete value or the `"*"`
/// wildcard meaning "unspecified/ignore".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckValue<T> {
    /// Accept anything.
    Star,
    /// Require equality with the parsed value.
    Equal(T),
}

impl<T> CheckValue<T> {
    /// True for the `"*"` wildcard.
    pub fn is_star(&self) -> bool {
        matches!(self, CheckValue::Star)
    }
}

impl<T: Default> Default for CheckValue<T> {
    fn default() -> Self {
        CheckValue::Star
    }
}

/// The string form a check value was written in, for writing back.
pub fn check_original<T>(check: &CheckValue<T>, original: impl Fn(&T) -> String) -> String {
    match check {
        CheckValue::Star => "*".to_owned(),
        CheckValue::Equal(inner) => original(inner),
    }
}

impl CheckValue<BytesValue> {
    /// Parses a check string, honoring the wildcard.
    pub fn parse(raw: &str, context: &InterpreterContext) -> Result<Self, ScenarioError> {
        if raw == "*" {
            Ok(CheckValue::Star)
        } else {
            Ok(CheckValue::Equal(BytesValue::parse(raw, context)?))
        }
    }

    /// Whether `actual` satisfies this expectation.
    pub fn check(&self, actual: &[u8]) -> bool {
        match self {
            CheckValue::Star => true,
            CheckValue::Equal(expected) => expected.value == actual,
        }
    }
}

impl CheckValue<U64Value> {
    /// Parses a check string, honoring the wildcard.
    pub fn parse(raw: &str, context: &InterpreterContext) -> Result<Self, ScenarioError> {
        if raw == "*" {
            Ok(CheckValue::Star)
        } else {
            Ok(CheckValue::Equal(U64Value::parse(raw, context)?))
        }
    }

    /// Whether `actual` satisfies this expectation.
    pub fn check(&self, actual: u64) -> bool {
        match self {
            CheckValue::Star => true,
            CheckValue::Equal(expected) => expected.value == actual,
        }
    }
}

impl CheckValue<BigUintValue> {
    /// Parses a check string, honoring the wildcard.
    pub fn parse(raw: &str, context: &InterpreterContext) -> Result<Self, ScenarioError> {
        if raw == "*" {
            Ok(CheckValue::Star)
        } else {
            Ok(CheckValue::Equal(BigUintValue::parse(raw, context)?))
        }
    }

    /// Whether `actual` satisfies this expectation.
    pub fn check(&self, actual: &num_bigint::BigUint) -> bool {
        match self {
            CheckValue::Star => true,
            CheckValue::Equal(expected) => &expected.value == actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_star_as_wildcard() {
        let context = InterpreterContext::default();
        let check = CheckValue::<BytesValue>::parse("*", &context).unwrap();
        assert!(check.is_star());
        assert!(check.check(b"anything"));
    }

    #[test]
    fn should_check_equality_for_concrete_values() {
        let context = InterpreterContext::default();
        let check = CheckValue::<BytesValue>::parse("str:abc", &context).unwrap();
        assert!(check.check(b"abc"));
        assert!(!check.check(b"abd"));
    }
}
