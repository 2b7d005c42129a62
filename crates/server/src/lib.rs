//! Foodlane Server - HTTP API for the food ordering platform.
//!
//! # Architecture
//!
//! - Axum router with user, vendor and public shopping routes
//! - Stateless sessions: HS256 tokens in an HTTP-only cookie or bearer header
//! - Repository traits with `PostgreSQL` and in-memory backends
//! - Uploaded images on local disk, served under `/images`
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`db`] - Repositories and storage backends
//! - [`services`] - Business logic
//! - [`routes`] - HTTP handlers
//! - [`middleware`] - Session extractors, request ids, rate limiting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod images;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ServerConfig;
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
