//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Readiness (storage ping)
//! GET  /images/*                    - Uploaded images
//!
//! /user/...                         - Signup, login, OTP, profile, orders
//! /vendor/...                       - Login, profile, foods, orders, offers
//!
//! GET  /offers                      - GENERIC offers
//! GET  /{pincode}                   - Serving restaurants with foods
//! GET  /top-restaurants/{pincode}   - Best rated ten
//! GET  /foods-in-30-min/{pincode}   - Quick foods
//! GET  /search/{pincode}?q=         - Food search
//! GET  /restaurant/{id}             - One restaurant
//! ```

pub mod shopping;
pub mod user;
pub mod vendor;

use axum::{
    Router,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::from_fn,
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Assemble the full application router.
///
/// Sentry layers are added by the binary on top of this.
pub fn build_router(state: AppState) -> Router {
    let images_dir = state.config().images_dir.clone();

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/user", user::router(&state))
        .nest("/vendor", vendor::router(&state))
        .merge(shopping::router())
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
