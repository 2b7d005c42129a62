//! One-time password challenges.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long an issued code stays valid.
pub const OTP_VALIDITY_MINUTES: i64 = 30;

/// Why a submitted code was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OtpError {
    /// The code does not match the stored one, or none is stored.
    #[error("otp does not match")]
    Mismatch,
    /// The code matched but its validity window has passed.
    #[error("otp has expired")]
    Expired,
}

/// A stored code together with its expiry.
///
/// The pair is one value so that clearing it can never leave a code without
/// its expiry or the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    pub code: u32,
    pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
    /// Lowest code ever issued (six digits).
    pub const MIN_CODE: u32 = 100_000;
    /// Highest code ever issued.
    pub const MAX_CODE: u32 = 999_999;

    /// Build a challenge for `code` issued at `issued_at`.
    #[must_use]
    pub fn new(code: u32, issued_at: DateTime<Utc>) -> Self {
        Self {
            code,
            expires_at: issued_at + Duration::minutes(OTP_VALIDITY_MINUTES),
        }
    }

    /// Check `submitted` against this challenge at time `now`.
    ///
    /// A wrong code is reported as [`OtpError::Mismatch`] before expiry is
    /// considered; a correct code after `expires_at` is [`OtpError::Expired`].
    ///
    /// # Errors
    ///
    /// Returns the first failed check.
    pub fn check(&self, submitted: u32, now: DateTime<Utc>) -> Result<(), OtpError> {
        if self.code != submitted {
            return Err(OtpError::Mismatch);
        }
        if now > self.expires_at {
            return Err(OtpError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-10T12:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default()
    }

    #[test]
    fn test_expiry_is_thirty_minutes_out() {
        let challenge = OtpChallenge::new(123_456, issued());
        assert_eq!(challenge.expires_at - issued(), Duration::minutes(30));
    }

    #[test]
    fn test_check_accepts_matching_code_in_window() {
        let challenge = OtpChallenge::new(123_456, issued());
        assert_eq!(challenge.check(123_456, issued() + Duration::minutes(29)), Ok(()));
        assert_eq!(challenge.check(123_456, challenge.expires_at), Ok(()));
    }

    #[test]
    fn test_check_expired_even_when_code_matches() {
        let challenge = OtpChallenge::new(123_456, issued());
        let late = challenge.expires_at + Duration::seconds(1);
        assert_eq!(challenge.check(123_456, late), Err(OtpError::Expired));
    }

    #[test]
    fn test_check_mismatch_wins_over_expiry() {
        let challenge = OtpChallenge::new(123_456, issued());
        let late = challenge.expires_at + Duration::hours(2);
        assert_eq!(challenge.check(654_321, late), Err(OtpError::Mismatch));
    }
}
