use std::time::Duration;

use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::AuthError;
use crate::oauth::{AuthClient, ProviderConfig};

/// Longest accepted session lifetime. Browsers cap cookie lifetimes near this.
pub const MAX_SESSION_TTL_DAYS: u16 = 400;

/// Shared auth settings used by both config and runtime state.
#[derive(Clone)]
pub(crate) struct AuthSettings {
    pub(crate) cookie_key: Key,
    pub(crate) session_cookie_name: String,
    pub(crate) session_ttl_days: u16,
    pub(crate) secure_cookies: bool,
    pub(crate) login_redirect: String,
}

impl AuthSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            session_cookie_name: "session".into(),
            session_ttl_days: 7,
            secure_cookies: true,
            login_redirect: "/".into(),
        }
    }
}

/// Authentication configuration, built once at startup.
///
/// Required field (`client`) is a constructor parameter, so there are no runtime "missing field" errors.
///
/// Use [`from_env()`](AuthConfig::from_env) for convention-based setup,
/// or [`new()`](AuthConfig::new) with `with_*` methods for full control.
pub struct AuthConfig {
    pub(super) client: AuthClient,
    pub(super) settings: AuthSettings,
}

impl AuthConfig {
    /// Create config with the required `AuthClient`.
    ///
    /// The cookie key defaults to an ephemeral one; sessions then do not
    /// survive a restart.
    #[must_use]
    pub fn new(client: AuthClient) -> Self {
        Self {
            client,
            settings: AuthSettings::defaults(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `USERPOOL_CLIENT_ID`: OAuth2 client ID
    /// - `USERPOOL_CLIENT_SECRET`: OAuth2 client secret
    /// - `USERPOOL_BASE_URL`: provider hosted-UI domain, e.g. `https://pool.auth.region.example.com`
    /// - `USERPOOL_REDIRECT_URI`: OAuth2 callback URI (must be a valid URL)
    /// - `SESSION_SECRET`: session cookie key material (at least 64 bytes)
    ///
    /// # Optional env vars
    /// - `USERPOOL_SCOPES`: Comma-separated OAuth2 scopes
    /// - `USERPOOL_HTTP_TIMEOUT_SECS`: per-call provider timeout (default 10)
    /// - `SESSION_TTL_DAYS`: session cookie lifetime, `1..=400` (default 7)
    /// - `INSECURE_COOKIES`: Set to `"1"` or `"true"` to drop the `Secure` cookie attribute
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env()`](AuthConfig::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if required values are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| AuthError::Config(format!("{name} is required")))
        };
        let parse_url = |name: &str| -> Result<Url, AuthError> {
            required(name)?
                .parse()
                .map_err(|e| AuthError::Config(format!("{name}: {e}")))
        };

        let client_id = required("USERPOOL_CLIENT_ID")?;
        let client_secret = required("USERPOOL_CLIENT_SECRET")?;
        let base_url = parse_url("USERPOOL_BASE_URL")?;
        let redirect_uri = parse_url("USERPOOL_REDIRECT_URI")?;

        let secret = required("SESSION_SECRET")?;
        let cookie_key = Key::try_from(secret.as_bytes()).map_err(|_| {
            AuthError::Config("SESSION_SECRET is invalid (must be at least 64 bytes)".into())
        })?;

        let mut provider = ProviderConfig::new(client_id, client_secret, base_url, redirect_uri);

        if let Some(scopes) = lookup("USERPOOL_SCOPES") {
            provider = provider.with_scopes(
                scopes
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        if let Some(secs) = lookup("USERPOOL_HTTP_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .map_err(|e| AuthError::Config(format!("USERPOOL_HTTP_TIMEOUT_SECS: {e}")))?;
            provider = provider.with_timeout(Duration::from_secs(secs));
        }

        let client = AuthClient::new(provider).map_err(|e| AuthError::Config(e.to_string()))?;
        let mut config = Self::new(client).with_cookie_key(cookie_key);

        if let Some(days) = lookup("SESSION_TTL_DAYS") {
            let days = days
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|d| (1..=MAX_SESSION_TTL_DAYS).contains(d))
                .ok_or_else(|| {
                    AuthError::Config(format!(
                        "SESSION_TTL_DAYS must be a whole number of days in 1..={MAX_SESSION_TTL_DAYS}, got {days:?}"
                    ))
                })?;
            config = config.with_session_ttl_days(days);
        }

        let insecure = matches!(
            lookup("INSECURE_COOKIES").as_deref(),
            Some("1") | Some("true"),
        );

        Ok(config.with_secure_cookies(!insecure))
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.settings.session_cookie_name = name.into();
        self
    }

    /// Session cookie lifetime, clamped to `1..=MAX_SESSION_TTL_DAYS`.
    #[must_use]
    pub fn with_session_ttl_days(mut self, days: u16) -> Self {
        self.settings.session_ttl_days = days.clamp(1, MAX_SESSION_TTL_DAYS);
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Where a completed (or short-circuited) login lands. Default `/`.
    #[must_use]
    pub fn with_login_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.login_redirect = path.into();
        self
    }

    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }
}
