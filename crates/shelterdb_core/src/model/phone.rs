//! Validated phone number attribute.
//!
//! # Responsibility
//! - Normalize user input to the 10-digit storage form.
//! - Render the storage form with `DDD-DDD-DDDD` grouping.
//!
//! # Invariants
//! - A `Phone` value always holds exactly 10 ASCII digits.
//! - Grouping hyphens are presentation only and never stored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PHONE_DIGITS: usize = 10;

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[- ]").expect("valid separator regex"));

/// Validation failure for phone input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Digit count after stripping separators was not 10.
    InvalidLength { digits: usize },
    /// Input contained something other than digits, hyphens and spaces.
    InvalidCharacter(char),
}

impl Display for PhoneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLength { digits } => write!(
                f,
                "phone number must be {PHONE_DIGITS} digits long, got {digits}"
            ),
            Self::InvalidCharacter(c) => write!(f, "phone number contains invalid character `{c}`"),
        }
    }
}

impl Error for PhoneError {}

/// Phone number in normalized 10-digit form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Parses user input, accepting hyphens and spaces as separators.
    pub fn parse(input: &str) -> Result<Self, PhoneError> {
        let stripped = SEPARATOR_RE.replace_all(input, "");
        if let Some(bad) = stripped.chars().find(|c| !c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCharacter(bad));
        }

        let digits = stripped.len();
        if digits != PHONE_DIGITS {
            return Err(PhoneError::InvalidLength { digits });
        }

        Ok(Self(stripped.into_owned()))
    }

    /// Storage form: 10 digits, no separators.
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Presentation form with 3-3-4 grouping.
    pub fn formatted(&self) -> String {
        format!("{}-{}-{}", &self.0[0..3], &self.0[3..6], &self.0[6..10])
    }
}

impl Display for Phone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(value: Phone) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Phone, PhoneError};

    #[test]
    fn parse_strips_hyphens_and_spaces() {
        for input in ["555-555-5555", "555 555 5555", "5555555555", " 555-555 5555 ", "5-5-5-5-5-5-5-5-5-5"] {
            let phone = Phone::parse(input).expect("separated input should parse");
            assert_eq!(phone.digits(), "5555555555", "input `{input}`");
        }
    }

    #[test]
    fn formatted_groups_three_three_four() {
        let phone = Phone::parse("555 243 9988").unwrap();
        assert_eq!(phone.formatted(), "555-243-9988");
        assert_eq!(phone.to_string(), "555-243-9988");
    }

    #[test]
    fn parse_rejects_wrong_digit_counts() {
        assert_eq!(
            Phone::parse("555-555-555").unwrap_err(),
            PhoneError::InvalidLength { digits: 9 }
        );
        assert_eq!(
            Phone::parse("12345678901").unwrap_err(),
            PhoneError::InvalidLength { digits: 11 }
        );
        assert_eq!(
            Phone::parse("").unwrap_err(),
            PhoneError::InvalidLength { digits: 0 }
        );
    }

    #[test]
    fn parse_rejects_other_separators() {
        assert_eq!(
            Phone::parse("(555) 555-5555").unwrap_err(),
            PhoneError::InvalidCharacter('(')
        );
        assert_eq!(
            Phone::parse("555.555.5555").unwrap_err(),
            PhoneError::InvalidCharacter('.')
        );
    }
}
