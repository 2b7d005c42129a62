//! Customer accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::otp::{OtpChallenge, OtpError};
use crate::types::{Email, UserId};

/// A customer account.
///
/// `password_hash` is an Argon2 PHC string, so the salt travels inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub password_hash: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub verified: bool,
    pub otp: Option<OtpChallenge>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data collected at signup.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub phone: String,
}

impl User {
    /// Create an unverified account holding its first OTP challenge.
    #[must_use]
    pub fn new(new: NewUser, otp: OtpChallenge, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::generate(),
            email: new.email,
            password_hash: new.password_hash,
            phone: new.phone,
            first_name: String::new(),
            last_name: String::new(),
            address: String::new(),
            verified: false,
            otp: Some(otp),
            lat: None,
            lng: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace any pending challenge with `otp`.
    pub fn set_otp(&mut self, otp: OtpChallenge, now: DateTime<Utc>) {
        self.otp = Some(otp);
        self.updated_at = now;
    }

    /// Verify the account with a submitted code.
    ///
    /// On success the account is marked verified and the challenge is
    /// dropped, so the same code cannot be replayed.
    ///
    /// # Errors
    ///
    /// [`OtpError::Mismatch`] when no challenge is pending or the code differs,
    /// [`OtpError::Expired`] when the window has passed.
    pub fn verify_otp(&mut self, submitted: u32, now: DateTime<Utc>) -> Result<(), OtpError> {
        let challenge = self.otp.ok_or(OtpError::Mismatch)?;
        challenge.check(submitted, now)?;
        self.verified = true;
        self.otp = None;
        self.updated_at = now;
        Ok(())
    }

    /// Name shown to other parties, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.to_string()
        } else {
            full.to_owned()
        }
    }
}

/// Partial profile edit. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address: Option<String>,
}

impl UserProfilePatch {
    /// Apply the present fields to `user`.
    pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(address) = self.address {
            user.address = address;
        }
        user.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user(now: DateTime<Utc>) -> User {
        User::new(
            NewUser {
                email: Email::parse("diner@example.com").unwrap(),
                password_hash: "hash".to_owned(),
                phone: "9876543210".to_owned(),
            },
            OtpChallenge::new(424_242, now),
            now,
        )
    }

    #[test]
    fn test_new_user_is_unverified_with_pending_otp() {
        let now = Utc::now();
        let u = user(now);
        assert!(!u.verified);
        assert_eq!(u.otp.map(|o| o.code), Some(424_242));
    }

    #[test]
    fn test_verify_clears_challenge_and_blocks_replay() {
        let now = Utc::now();
        let mut u = user(now);
        u.verify_otp(424_242, now + Duration::minutes(1)).unwrap();
        assert!(u.verified);
        assert!(u.otp.is_none());
        assert_eq!(
            u.verify_otp(424_242, now + Duration::minutes(2)),
            Err(OtpError::Mismatch)
        );
    }

    #[test]
    fn test_expired_verify_leaves_account_unverified() {
        let now = Utc::now();
        let mut u = user(now);
        let result = u.verify_otp(424_242, now + Duration::minutes(31));
        assert_eq!(result, Err(OtpError::Expired));
        assert!(!u.verified);
        assert!(u.otp.is_some());
    }

    #[test]
    fn test_profile_patch_only_touches_present_fields() {
        let now = Utc::now();
        let mut u = user(now);
        u.first_name = "Asha".to_owned();
        u.address = "12 MG Road".to_owned();
        let before = u.clone();

        UserProfilePatch {
            last_name: Some("Rao".to_owned()),
            ..Default::default()
        }
        .apply(&mut u, now);

        assert_eq!(u.last_name, "Rao");
        assert_eq!(u.first_name, before.first_name);
        assert_eq!(u.address, before.address);
        assert_eq!(u.email, before.email);
        assert_eq!(u.display_name(), "Asha Rao");
    }
}
