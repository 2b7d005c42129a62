//! Identity service.
//!
//! Password signup and login for users, password login for vendors, and the
//! OTP step that moves a user from unverified to verified.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use thiserror::Error;

use foodlane_core::{
    Email, EmailError, NewUser, OtpChallenge, OtpError, User, UserId, UserProfilePatch, Vendor,
};

use crate::db::{RepositoryError, Store};
use crate::services::otp::{NotifyError, OtpNotifier, generate_code};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    #[error("phone number is required")]
    InvalidPhone,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// No account is registered under the login email.
    #[error("login credentials invalid")]
    UnknownIdentity,

    /// The password does not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session refers to an account that no longer exists.
    #[error("account not found")]
    AccountNotFound,

    #[error(transparent)]
    Otp(#[from] OtpError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

/// Identity service.
pub struct AuthService<'a> {
    store: &'a Store,
    notifier: &'a dyn OtpNotifier,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(store: &'a Store, notifier: &'a dyn OtpNotifier) -> Self {
        Self { store, notifier }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register an unverified user and send their first OTP.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword` or
    /// `AuthError::InvalidPhone` for bad input, and
    /// `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        phone: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(AuthError::InvalidPhone);
        }

        let password_hash = hash_password(password)?;
        let now = Utc::now();
        let user = User::new(
            NewUser {
                email,
                password_hash,
                phone: phone.to_owned(),
            },
            OtpChallenge::new(generate_code(), now),
            now,
        );

        self.store.users.insert(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        if let Some(challenge) = &user.otp {
            self.notifier.deliver(&user, challenge).await?;
        }

        tracing::info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Login a user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownIdentity` if no user has this email and
    /// `AuthError::InvalidCredentials` if the password is wrong.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let Some(user) = self.store.users.get_by_email(&email).await? else {
            tracing::warn!(email = %email, "Login for unknown user");
            return Err(AuthError::UnknownIdentity);
        };

        if let Err(e) = verify_password(password, &user.password_hash) {
            tracing::warn!(user_id = %user.id, "User login failed");
            return Err(e);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    /// Login a vendor with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownIdentity` if no vendor has this email and
    /// `AuthError::InvalidCredentials` if the password is wrong.
    pub async fn login_vendor(&self, email: &str, password: &str) -> Result<Vendor, AuthError> {
        let email = Email::parse(email)?;
        let Some(vendor) = self.store.vendors.get_by_email(&email).await? else {
            tracing::warn!(email = %email, "Login for unknown vendor");
            return Err(AuthError::UnknownIdentity);
        };

        if let Err(e) = verify_password(password, &vendor.password_hash) {
            tracing::warn!(vendor_id = %vendor.id, "Vendor login failed");
            return Err(e);
        }

        tracing::info!(vendor_id = %vendor.id, "Vendor logged in");
        Ok(vendor)
    }

    // =========================================================================
    // OTP Verification
    // =========================================================================

    /// Replace the pending code with a fresh one and deliver it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the user no longer exists.
    pub async fn request_otp(&self, user_id: UserId) -> Result<OtpChallenge, AuthError> {
        let mut user = self.get_user(user_id).await?;
        let now = Utc::now();
        let challenge = OtpChallenge::new(generate_code(), now);
        user.set_otp(challenge, now);
        self.store.users.update(&user).await?;
        self.notifier.deliver(&user, &challenge).await?;
        Ok(challenge)
    }

    /// Check a submitted code and mark the user verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Otp` on a wrong or expired code and
    /// `AuthError::AccountNotFound` if the user no longer exists.
    pub async fn verify_otp(&self, user_id: UserId, code: u32) -> Result<User, AuthError> {
        let mut user = self.get_user(user_id).await?;
        user.verify_otp(code, Utc::now())?;
        self.store.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "User verified");
        Ok(user)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .users
            .get(user_id)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Apply a profile edit.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountNotFound` if the user doesn't exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        patch: UserProfilePatch,
    ) -> Result<User, AuthError> {
        let mut user = self.get_user(user_id).await?;
        patch.apply(&mut user, Utc::now());
        self.store.users.update(&user).await?;
        Ok(user)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        codes: Mutex<Vec<u32>>,
    }

    impl RecordingNotifier {
        fn last(&self) -> u32 {
            *self.codes.lock().unwrap().last().unwrap()
        }
    }

    #[async_trait]
    impl OtpNotifier for RecordingNotifier {
        async fn deliver(&self, _user: &User, challenge: &OtpChallenge) -> Result<(), NotifyError> {
            self.codes.lock().unwrap().push(challenge.code);
            Ok(())
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("12345678").is_ok());
    }

    #[tokio::test]
    async fn test_signup_sends_otp_and_rejects_duplicates() {
        let store = Store::memory();
        let notifier = RecordingNotifier::default();
        let auth = AuthService::new(&store, &notifier);

        let user = auth
            .signup("Diner@Example.com", "password123", "9876543210")
            .await
            .unwrap();
        assert!(!user.verified);
        assert_eq!(user.otp.map(|o| o.code), Some(notifier.last()));

        let again = auth.signup("diner@example.com", "password456", "9000000000").await;
        assert!(matches!(again, Err(AuthError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_signup_requires_phone() {
        let store = Store::memory();
        let notifier = RecordingNotifier::default();
        let auth = AuthService::new(&store, &notifier);
        let result = auth.signup("a@example.com", "password123", "  ").await;
        assert!(matches!(result, Err(AuthError::InvalidPhone)));
    }

    #[tokio::test]
    async fn test_login_distinguishes_unknown_email_from_bad_password() {
        let store = Store::memory();
        let notifier = RecordingNotifier::default();
        let auth = AuthService::new(&store, &notifier);
        auth.signup("diner@example.com", "password123", "9876543210")
            .await
            .unwrap();

        assert!(matches!(
            auth.login_user("nobody@example.com", "password123").await,
            Err(AuthError::UnknownIdentity)
        ));
        assert!(matches!(
            auth.login_user("diner@example.com", "password999").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(auth.login_user("diner@example.com", "password123").await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_otp_once() {
        let store = Store::memory();
        let notifier = RecordingNotifier::default();
        let auth = AuthService::new(&store, &notifier);
        let user = auth
            .signup("diner@example.com", "password123", "9876543210")
            .await
            .unwrap();
        let code = notifier.last();
        let wrong = if code == OtpChallenge::MAX_CODE { code - 1 } else { code + 1 };

        assert!(matches!(
            auth.verify_otp(user.id, wrong).await,
            Err(AuthError::Otp(OtpError::Mismatch))
        ));

        let verified = auth.verify_otp(user.id, code).await.unwrap();
        assert!(verified.verified);
        assert!(verified.otp.is_none());

        assert!(matches!(
            auth.verify_otp(user.id, code).await,
            Err(AuthError::Otp(OtpError::Mismatch))
        ));
    }

    #[tokio::test]
    async fn test_request_otp_replaces_code() {
        let store = Store::memory();
        let notifier = RecordingNotifier::default();
        let auth = AuthService::new(&store, &notifier);
        let user = auth
            .signup("diner@example.com", "password123", "9876543210")
            .await
            .unwrap();

        let challenge = auth.request_otp(user.id).await.unwrap();
        assert_eq!(challenge.code, notifier.last());
        let stored = auth.get_user(user.id).await.unwrap();
        assert_eq!(stored.otp, Some(challenge));

        assert!(matches!(
            auth.request_otp(UserId::generate()).await,
            Err(AuthError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_profile_keeps_absent_fields() {
        let store = Store::memory();
        let notifier = RecordingNotifier::default();
        let auth = AuthService::new(&store, &notifier);
        let user = auth
            .signup("diner@example.com", "password123", "9876543210")
            .await
            .unwrap();

        auth.update_profile(
            user.id,
            UserProfilePatch {
                first_name: Some("Asha".to_owned()),
                address: Some("MG Road".to_owned()),
                ..UserProfilePatch::default()
            },
        )
        .await
        .unwrap();
        let updated = auth
            .update_profile(
                user.id,
                UserProfilePatch {
                    last_name: Some("Rao".to_owned()),
                    ..UserProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Asha");
        assert_eq!(updated.last_name, "Rao");
        assert_eq!(updated.address, "MG Road");
    }
}
