//! HTTP-level test harness for the Foodlane API.
//!
//! [`TestApp`] wires the real router to the in-memory store and drives it
//! with `tower::ServiceExt::oneshot`, so no server or database is needed.
//! OTP codes are captured by a recording notifier instead of being sent.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p foodlane-integration-tests
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use foodlane_core::{Email, OtpChallenge, Pincode, User, Vendor};
use foodlane_server::config::{JwtConfig, ServerConfig};
use foodlane_server::db::Store;
use foodlane_server::images::{ImageStore, ImageStoreError};
use foodlane_server::services::{NotifyError, Onboarding, OtpNotifier, VendorService};
use foodlane_server::{AppState, build_router};

/// Signing secret used by every test app.
pub const JWT_SECRET: &str = "kT9#vQ2$mX7@pL4!wR8^zN3&bH6*jF1%";

/// Password given to every account created through the helpers.
pub const PASSWORD: &str = "hunter2-hunter2";

const BOUNDARY: &str = "foodlane-test-boundary";

// =============================================================================
// Fakes
// =============================================================================

/// Keeps the last code delivered to each email.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    codes: Mutex<HashMap<String, u32>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn code_for(&self, email: &str) -> Option<u32> {
        self.codes.lock().unwrap().get(email).copied()
    }
}

#[async_trait]
impl OtpNotifier for RecordingNotifier {
    async fn deliver(&self, user: &User, challenge: &OtpChallenge) -> Result<(), NotifyError> {
        self.codes
            .lock()
            .unwrap()
            .insert(user.email.to_string(), challenge.code);
        Ok(())
    }
}

/// Remembers uploaded file names instead of writing them.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    saved: Mutex<Vec<String>>,
    uploads: AtomicUsize,
}

impl MemoryImageStore {
    /// Names currently stored, in upload order.
    #[must_use]
    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().unwrap().clone()
    }

    /// Every save call so far, including images removed since.
    #[must_use]
    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, original_name: &str, _bytes: &[u8]) -> Result<String, ImageStoreError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        let name = format!("{n}_{original_name}");
        self.saved.lock().unwrap().push(name.clone());
        Ok(name)
    }

    async fn remove(&self, name: &str) -> Result<(), ImageStoreError> {
        self.saved.lock().unwrap().retain(|saved| saved != name);
        Ok(())
    }
}

// =============================================================================
// Test App
// =============================================================================

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body, `Value::Null` when the body is not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of the JSON envelope.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

/// The router plus handles on its fakes.
#[derive(Clone)]
pub struct TestApp {
    state: AppState,
    router: Router,
    notifier: Arc<RecordingNotifier>,
    images: Arc<MemoryImageStore>,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        Self::build(Store::memory(), false)
    }

    /// An app with the login and signup rate limits switched on.
    #[must_use]
    pub fn rate_limited() -> Self {
        Self::build(Store::memory(), true)
    }

    /// An app over a caller-assembled store, for swapping in failing
    /// repositories.
    #[must_use]
    pub fn with_store(store: Store) -> Self {
        Self::build(store, false)
    }

    fn build(store: Store, rate_limit: bool) -> Self {
        let config = ServerConfig {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            jwt: JwtConfig {
                secret: SecretString::from(JWT_SECRET),
                expiration_minutes: 60,
                issuer: "foodlane-test".to_owned(),
            },
            cookie_secure: false,
            images_dir: std::env::temp_dir(),
            rate_limit,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };
        let notifier = Arc::new(RecordingNotifier::default());
        let images = Arc::new(MemoryImageStore::default());
        let state = AppState::new(config, store, notifier.clone(), images.clone());
        Self {
            router: build_router(state.clone()),
            state,
            notifier,
            images,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        self.state.store()
    }

    #[must_use]
    pub fn images(&self) -> &MemoryImageStore {
        &self.images
    }

    /// Last OTP delivered to `email`.
    #[must_use]
    pub fn otp_for(&self, email: &str) -> u32 {
        self.notifier
            .code_for(email)
            .unwrap_or_else(|| panic!("no OTP delivered to {email}"))
    }

    /// Send one request through the app's router. Rate limiter state is
    /// shared between requests.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> TestResponse {
        let request = request(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn multipart(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        fields: &[(&str, &str)],
        files: &[(&str, &[u8])],
    ) -> TestResponse {
        let request = request(method, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(fields, files)))
            .unwrap();
        self.send(request).await
    }

    // =========================================================================
    // Account helpers
    // =========================================================================

    /// Sign up a user and return the unverified session token.
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .json(
                Method::POST,
                "/user/signup",
                None,
                &serde_json::json!({
                    "email": email,
                    "password": PASSWORD,
                    "phone": "9876543210",
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        token(&response)
    }

    /// Sign up and verify a user, returning the verified session token.
    pub async fn verified_user(&self, email: &str) -> String {
        let pending = self.signup(email).await;
        let response = self
            .json(
                Method::POST,
                "/user/verify",
                Some(&pending),
                &serde_json::json!({ "otp": self.otp_for(email) }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        token(&response)
    }

    /// Onboard a vendor straight through the service, as the CLI does.
    pub async fn onboard_vendor(&self, email: &str, pincode: &str) -> Vendor {
        VendorService::new(self.store())
            .onboard(Onboarding {
                email: Email::parse(email).unwrap(),
                password: PASSWORD.to_owned(),
                name: format!("Kitchen {email}"),
                owner_name: "Owner".to_owned(),
                food_types: vec!["veg".to_owned()],
                pincode: Pincode::parse(pincode).unwrap(),
                address: "1 Market Street".to_owned(),
                phone: "9000000000".to_owned(),
            })
            .await
            .unwrap()
    }

    /// Log a vendor in and return the session token.
    pub async fn vendor_login(&self, email: &str) -> String {
        let response = self
            .json(
                Method::POST,
                "/vendor/login",
                None,
                &serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        token(&response)
    }

    /// Onboard, log in and switch service on. Returns the vendor id and token.
    pub async fn serving_vendor(&self, email: &str, pincode: &str) -> (String, String) {
        let vendor = self.onboard_vendor(email, pincode).await;
        let token = self.vendor_login(email).await;
        let response = self
            .json(Method::PATCH, "/vendor/service", Some(&token), &Value::Null)
            .await;
        assert_eq!(response.body["serviceAvailable"], true);
        (vendor.id.to_string(), token)
    }

    /// Add a food through the multipart endpoint and return its id.
    pub async fn add_food(&self, token: &str, name: &str, price: &str, ready: &str) -> String {
        let response = self
            .multipart(
                Method::POST,
                "/vendor/food",
                Some(token),
                &[
                    ("name", name),
                    ("description", "House special"),
                    ("category", "Mains"),
                    ("foodType", "veg"),
                    ("readyTime", ready),
                    ("price", price),
                ],
                &[],
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["food"]["id"].as_str().unwrap().to_owned()
    }
}

fn request(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// The `token` field of a session response.
#[must_use]
pub fn token(response: &TestResponse) -> String {
    response.body["token"]
        .as_str()
        .unwrap_or_else(|| panic!("no token in {:?}", response.body))
        .to_owned()
}

fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\n\
                 Content-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
