//! Unified error handling for the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::images::ImageStoreError;
use crate::services::{
    AuthError, CatalogError, JwtError, OfferError, OrderServiceError, VendorError,
};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Vendor(#[from] VendorError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Offer(#[from] OfferError),

    #[error(transparent)]
    Order(#[from] OrderServiceError),

    /// Uploaded image could not be stored.
    #[error("Image error: {0}")]
    Images(#[from] ImageStoreError),

    /// Session token could not be issued.
    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error is reported with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(e) | Self::Vendor(VendorError::Credentials(e)) => auth_status(e),
            Self::Vendor(VendorError::NotFound)
            | Self::Catalog(CatalogError::VendorNotFound)
            | Self::Offer(OfferError::VendorNotFound | OfferError::OfferNotFound)
            | Self::Order(OrderServiceError::OrderNotFound)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Vendor(VendorError::AlreadyExists) => StatusCode::CONFLICT,
            Self::Catalog(CatalogError::InvalidFood(_))
            | Self::Order(OrderServiceError::Invalid(_))
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Database(_)
            | Self::Vendor(VendorError::Repository(_))
            | Self::Catalog(CatalogError::Repository(_))
            | Self::Offer(OfferError::Repository(_))
            | Self::Order(OrderServiceError::Repository(_))
            | Self::Images(_)
            | Self::Token(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

const fn auth_status(error: &AuthError) -> StatusCode {
    match error {
        AuthError::InvalidEmail(_)
        | AuthError::WeakPassword(_)
        | AuthError::InvalidPhone
        | AuthError::Otp(_) => StatusCode::BAD_REQUEST,
        AuthError::UserAlreadyExists | AuthError::UnknownIdentity => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::AccountNotFound => StatusCode::NOT_FOUND,
        AuthError::Repository(_) | AuthError::PasswordHash | AuthError::Notify(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Set the Sentry user context for the current request.
pub fn set_sentry_user(id: uuid::Uuid, email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(id.to_string()),
            email: Some(email.to_owned()),
            ..Default::default()
        }));
    });
}
