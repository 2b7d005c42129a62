//! Session extractors gating the user and vendor routes.
//!
//! The session token is read from the `foodlane_session` cookie, falling back
//! to an `Authorization: Bearer` header. Every gate answers 401 with the JSON
//! `{message}` envelope when it refuses a request.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use foodlane_core::Role;

use crate::error::set_sentry_user;
use crate::models::{Principal, SESSION_COOKIE_NAME};
use crate::services::jwt::extract_bearer;
use crate::state::AppState;

/// Verified user session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(UserSession(user): UserSession) -> impl IntoResponse {
///     format!("Hello, {}!", user.display_name)
/// }
/// ```
pub struct UserSession(pub Principal);

/// Vendor session.
pub struct VendorSession(pub Principal);

/// User session that has not passed the OTP step yet.
pub struct OtpSession(pub Principal);

/// Why a session gate refused the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No token in the cookie or `Authorization` header.
    MissingToken,
    /// Token is malformed, expired or signed with another key.
    InvalidToken,
    /// Token is valid but for the wrong kind of session.
    WrongRole,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Not authorized" })),
        )
            .into_response()
    }
}

impl FromRequestParts<AppState> for UserSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal(parts, state)?;
        if principal.role != Role::User || !principal.verified {
            return Err(AuthRejection::WrongRole);
        }
        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for VendorSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal(parts, state)?;
        if principal.role != Role::Vendor {
            return Err(AuthRejection::WrongRole);
        }
        Ok(Self(principal))
    }
}

impl FromRequestParts<AppState> for OtpSession {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = principal(parts, state)?;
        if principal.role != Role::User || principal.verified {
            return Err(AuthRejection::WrongRole);
        }
        Ok(Self(principal))
    }
}

fn principal(parts: &Parts, state: &AppState) -> Result<Principal, AuthRejection> {
    let token = session_token(&parts.headers).ok_or(AuthRejection::MissingToken)?;
    let claims = state.jwt().validate(&token).map_err(|e| {
        tracing::debug!(error = %e, "Session token rejected");
        AuthRejection::InvalidToken
    })?;
    let principal = Principal::from(claims);
    set_sentry_user(principal.id, principal.email.as_str());
    Ok(principal)
}

/// Pull the session token out of the request headers.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer)
            .map(str::to_owned)
    })
}

/// `Set-Cookie` value carrying a freshly issued session token.
#[must_use]
pub fn session_cookie(token: &str, state: &AppState) -> String {
    Cookie::build((SESSION_COOKIE_NAME, token.to_owned()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(state.config().cookie_secure)
        .max_age(Duration::minutes(state.jwt().expiration_minutes()))
        .build()
        .to_string()
}
