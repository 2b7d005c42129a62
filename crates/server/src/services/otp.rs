//! OTP issuance and delivery.

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use foodlane_core::{OtpChallenge, User};

/// Delivery failed.
#[derive(Debug, Error)]
#[error("otp delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Hands a freshly issued code to the account holder.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    /// # Errors
    ///
    /// Returns `NotifyError` if the code could not be handed off.
    async fn deliver(&self, user: &User, challenge: &OtpChallenge) -> Result<(), NotifyError>;
}

/// Writes codes to the log. Stands in for an SMS gateway in development.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOtpNotifier;

#[async_trait]
impl OtpNotifier for LogOtpNotifier {
    async fn deliver(&self, user: &User, challenge: &OtpChallenge) -> Result<(), NotifyError> {
        tracing::info!(
            user_id = %user.id,
            phone = %user.phone,
            otp = challenge.code,
            expires_at = %challenge.expires_at,
            "OTP issued"
        );
        Ok(())
    }
}

/// Draw a six digit code.
#[must_use]
pub fn generate_code() -> u32 {
    rand::rng().random_range(OtpChallenge::MIN_CODE..=OtpChallenge::MAX_CODE)
}
