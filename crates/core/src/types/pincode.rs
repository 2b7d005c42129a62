//! Postal pincode used to scope catalog and offer geography.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Pincode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PincodeError {
    /// Wrong number of digits.
    #[error("pincode must be exactly {expected} digits")]
    Length {
        /// Required digit count.
        expected: usize,
    },
    /// Contains something other than ASCII digits.
    #[error("pincode must contain only digits")]
    NonDigit,
    /// Leading zero, which no postal circle uses.
    #[error("pincode cannot start with 0")]
    LeadingZero,
}

/// A six digit postal index number.
///
/// ```
/// use foodlane_core::Pincode;
///
/// assert!(Pincode::parse("560034").is_ok());
/// assert!(Pincode::parse("56003").is_err());
/// assert!(Pincode::parse("060034").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pincode(String);

impl Pincode {
    /// Number of digits in a pincode.
    pub const LENGTH: usize = 6;

    /// Parse a `Pincode`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`PincodeError`] if the input is not six digits or starts
    /// with zero.
    pub fn parse(s: &str) -> Result<Self, PincodeError> {
        let s = s.trim();
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PincodeError::NonDigit);
        }
        if s.len() != Self::LENGTH {
            return Err(PincodeError::Length {
                expected: Self::LENGTH,
            });
        }
        if s.starts_with('0') {
            return Err(PincodeError::LeadingZero);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the pincode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Pincode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Pincode {
    type Err = PincodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Pincode {
    type Error = PincodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pincode> for String {
    fn from(pincode: Pincode) -> Self {
        pincode.0
    }
}
