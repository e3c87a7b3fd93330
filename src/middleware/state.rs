use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::{AuthConfig, AuthSettings};
use crate::oauth::AuthClient;

/// Shared state for auth route handlers and guards.
#[derive(Clone)]
pub struct AuthState {
    pub(super) client: Arc<AuthClient>,
    pub(super) settings: Arc<AuthSettings>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        Self {
            client: Arc::new(config.client),
            settings: Arc::new(config.settings),
        }
    }

    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }
}

impl From<AuthConfig> for AuthState {
    fn from(config: AuthConfig) -> Self {
        Self::new(config)
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.settings.cookie_key.clone()
    }
}
