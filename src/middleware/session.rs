//! Cookie-backed session bag.
//!
//! The whole bag is a JSON object carried in one encrypted, authenticated
//! cookie. The authenticated principal lives under [`IDENTITY_KEY`]; its
//! absence means the request is anonymous.

use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::config::AuthSettings;
use super::cookies;
use super::error::SessionError;
use crate::types::Identity;

/// Bag key holding the serialized [`Identity`].
pub const IDENTITY_KEY: &str = "user";

/// Request-scoped view of the session cookie.
///
/// Reads are typed and never trust a payload whose shape does not match.
/// Writes are staged on the jar, which must be returned in the response.
pub struct Session {
    jar: PrivateCookieJar,
    values: Map<String, Value>,
    cookie_name: String,
    ttl_days: u16,
    secure: bool,
}

impl Session {
    /// Load the session bag from the request cookies.
    ///
    /// A cookie that fails to decrypt is ignored by the jar; one that decrypts
    /// but is not a JSON object is logged and treated as an empty bag.
    pub(crate) fn load(jar: PrivateCookieJar, settings: &AuthSettings) -> Self {
        let values = jar
            .get(&settings.session_cookie_name)
            .and_then(|cookie| match decode_bag(cookie.value()) {
                Ok(values) => Some(values),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding undecodable session");
                    None
                }
            })
            .unwrap_or_default();

        Self {
            jar,
            values,
            cookie_name: settings.session_cookie_name.clone(),
            ttl_days: settings.session_ttl_days,
            secure: settings.secure_cookies,
        }
    }

    /// The authenticated identity, if the bag holds a well-formed one.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        let value = self.values.get(IDENTITY_KEY)?;
        match decode_identity(value) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!(error = %e, "Session identity has unexpected shape");
                None
            }
        }
    }

    /// Store `identity` and persist the bag.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] if the bag cannot be serialized; the
    /// session is then left as it was.
    pub fn set_identity(mut self, identity: &Identity) -> Result<Self, SessionError> {
        let value = serde_json::to_value(identity).map_err(SessionError::Encode)?;
        let mut values = self.values.clone();
        values.insert(IDENTITY_KEY.to_string(), value);

        let encoded = serde_json::to_string(&values).map_err(SessionError::Encode)?;
        let cookie = cookies::session_cookie(&self.cookie_name, encoded, self.ttl_days, self.secure);

        self.values = values;
        self.jar = self.jar.add(cookie);
        Ok(self)
    }

    /// Expire the session cookie immediately.
    ///
    /// Always emits an expired cookie, whether or not a session existed.
    #[must_use]
    pub fn invalidate(mut self) -> Self {
        self.values.clear();
        self.jar = self.jar.add(cookies::clear_session_cookie(&self.cookie_name));
        self
    }

    /// Hand the jar back for the response, with any staged writes.
    #[must_use]
    pub fn into_jar(self) -> PrivateCookieJar {
        self.jar
    }
}

fn decode_bag(raw: &str) -> Result<Map<String, Value>, SessionError> {
    serde_json::from_str(raw).map_err(SessionError::Decode)
}

fn decode_identity(value: &Value) -> Result<Identity, SessionError> {
    Identity::deserialize(value).map_err(SessionError::Decode)
}
