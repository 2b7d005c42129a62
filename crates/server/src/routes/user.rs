//! User routes: signup, login, OTP verification, profile and orders.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;

use foodlane_core::{NewOrderItem, OrderId, User, UserProfilePatch, VendorId};

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::middleware::{OtpSession, UserSession, auth_rate_limiter, session_cookie};
use crate::models::{OrderView, Principal, UserProfile};
use crate::services::{AuthService, OrderService};
use crate::state::AppState;

/// Build the `/user` router.
pub fn router(state: &AppState) -> Router<AppState> {
    let mut credentials = Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login));
    if state.config().rate_limit
        && let Some(limiter) = auth_rate_limiter()
    {
        credentials = credentials.layer(limiter);
    }

    Router::new()
        .merge(credentials)
        .route("/verify", post(verify))
        .route("/otp", post(request_otp))
        .route("/profile", get(profile).patch(update_profile))
        .route("/create-order", post(create_order))
        .route("/orders", get(orders))
        .route("/order/{id}", get(order))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(deserialize_with = "otp_code")]
    pub otp: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub vendor_id: VendorId,
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
}

/// Body of every response that hands out a session.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub email: String,
    pub verified: bool,
    pub token: String,
}

/// Codes arrive as numbers from some clients and as strings from others.
fn otp_code<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(u32),
        Text(String),
    }

    match Code::deserialize(deserializer)? {
        Code::Number(code) => Ok(code),
        Code::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Issue a token for `user` and wrap it in a cookie-carrying response.
fn session_response(
    state: &AppState,
    user: &User,
    message: &'static str,
) -> Result<(HeaderMap, Json<SessionResponse>), AppError> {
    let token = state.jwt().issue(&Principal::from_user(user))?;
    let mut headers = HeaderMap::new();
    let cookie = HeaderValue::from_str(&session_cookie(&token, state))
        .map_err(|e| AppError::Internal(format!("session cookie: {e}")))?;
    headers.insert(SET_COOKIE, cookie);

    Ok((
        headers,
        Json(SessionResponse {
            message,
            email: user.email.to_string(),
            verified: user.verified,
            token,
        }),
    ))
}

// =============================================================================
// Handlers
// =============================================================================

async fn signup(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.store(), state.otp_notifier())
        .signup(&req.email, &req.password, &req.phone)
        .await?;
    session_response(&state, &user, "Signup successful")
}

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.store(), state.otp_notifier())
        .login_user(&req.email, &req.password)
        .await?;
    session_response(&state, &user, "Login successful")
}

async fn verify(
    State(state): State<AppState>,
    OtpSession(principal): OtpSession,
    JsonBody(req): JsonBody<VerifyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.store(), state.otp_notifier())
        .verify_otp(principal.user_id(), req.otp)
        .await?;
    session_response(&state, &user, "User verified")
}

async fn request_otp(
    State(state): State<AppState>,
    OtpSession(principal): OtpSession,
) -> Result<impl IntoResponse, AppError> {
    AuthService::new(state.store(), state.otp_notifier())
        .request_otp(principal.user_id())
        .await?;
    Ok(Json(json!({ "message": "OTP sent to your registered phone number" })))
}

async fn profile(
    State(state): State<AppState>,
    UserSession(principal): UserSession,
) -> Result<Json<UserProfile>, AppError> {
    let user = AuthService::new(state.store(), state.otp_notifier())
        .get_user(principal.user_id())
        .await?;
    Ok(Json(UserProfile::from(&user)))
}

async fn update_profile(
    State(state): State<AppState>,
    UserSession(principal): UserSession,
    JsonBody(patch): JsonBody<UserProfilePatch>,
) -> Result<impl IntoResponse, AppError> {
    let user = AuthService::new(state.store(), state.otp_notifier())
        .update_profile(principal.user_id(), patch)
        .await?;
    Ok(Json(json!({
        "message": "Profile updated",
        "profile": UserProfile::from(&user),
    })))
}

async fn create_order(
    State(state): State<AppState>,
    UserSession(principal): UserSession,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = OrderService::new(state.store())
        .create(principal.user_id(), req.vendor_id, &req.items)
        .await?;
    Ok(Json(json!({ "message": "Order created", "order": order })))
}

async fn orders(
    State(state): State<AppState>,
    UserSession(principal): UserSession,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let orders = OrderService::new(state.store())
        .list_for_user(principal.user_id())
        .await?;
    Ok(Json(orders))
}

async fn order(
    State(state): State<AppState>,
    UserSession(principal): UserSession,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>, AppError> {
    let order = OrderService::new(state.store())
        .get_for_user(principal.user_id(), id)
        .await?;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_accepts_number_or_string() {
        let n: VerifyRequest = serde_json::from_str(r#"{"otp": 123456}"#).unwrap();
        let s: VerifyRequest = serde_json::from_str(r#"{"otp": "654321"}"#).unwrap();
        assert_eq!(n.otp, 123_456);
        assert_eq!(s.otp, 654_321);
        assert!(serde_json::from_str::<VerifyRequest>(r#"{"otp": "12ab"}"#).is_err());
    }

    #[test]
    fn test_create_order_accepts_legacy_item_keys() {
        let vendor = VendorId::generate();
        let food = foodlane_core::FoodId::generate();
        let body = format!(r#"{{"vendorId":"{vendor}","items":[{{"_id":"{food}","unit":3}}]}}"#);
        let req: CreateOrderRequest = serde_json::from_str(&body).unwrap();
        assert_eq!(req.vendor_id, vendor);
        assert_eq!(req.items[0].food_id, food);
        assert_eq!(req.items[0].quantity, 3);
    }
}
