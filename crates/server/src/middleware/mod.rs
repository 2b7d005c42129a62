//! HTTP middleware and session extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction per route)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Rate limiting on login/signup routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthRejection, OtpSession, UserSession, VendorSession, session_cookie};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
