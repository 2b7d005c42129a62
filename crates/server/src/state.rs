//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::Store;
use crate::images::ImageStore;
use crate::services::{JwtService, OtpNotifier};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    jwt: JwtService,
    store: Store,
    otp_notifier: Arc<dyn OtpNotifier>,
    images: Arc<dyn ImageStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Repository handles (Postgres or in-memory)
    /// * `otp_notifier` - Where freshly issued OTP codes are sent
    /// * `images` - Storage for uploaded images
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Store,
        otp_notifier: Arc<dyn OtpNotifier>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let jwt = JwtService::new(&config.jwt);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                jwt,
                store,
                otp_notifier,
                images,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the session token service.
    #[must_use]
    pub fn jwt(&self) -> &JwtService {
        &self.inner.jwt
    }

    /// Get a reference to the repository handles.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    #[must_use]
    pub fn otp_notifier(&self) -> &dyn OtpNotifier {
        self.inner.otp_notifier.as_ref()
    }

    #[must_use]
    pub fn images(&self) -> &dyn ImageStore {
        self.inner.images.as_ref()
    }
}
