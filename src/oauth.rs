use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::csrf;
use crate::error::Error;

/// Identity provider `OAuth2` configuration.
///
/// Required fields are constructor parameters, so there are no runtime "missing field" errors.
///
/// ```rust,ignore
/// use userpool_auth::ProviderConfig;
///
/// let config = ProviderConfig::new(
///     "my-client-id",
///     "my-client-secret",
///     "https://my-pool.auth.example.com".parse()?,
///     "https://my-app.com/auth/callback".parse()?,
/// )
/// .with_timeout(std::time::Duration::from_secs(5));
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct ProviderConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) base_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("base_url", &self.base_url.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("scopes", &self.scopes)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a new provider configuration.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        base_url: Url,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            base_url,
            redirect_uri,
            scopes: vec!["openid".into(), "email".into(), "profile".into()],
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the `OAuth2` scopes (default: `["openid", "email", "profile"]`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Bound each provider call; an elapsed timeout surfaces as [`Error::Transport`].
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn token_url(&self) -> Url {
        self.endpoint(&["oauth2", "token"])
    }

    #[must_use]
    pub fn userinfo_url(&self) -> Url {
        self.endpoint(&["oauth2", "userInfo"])
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// `OAuth2` authorization-code client for the hosted identity provider.
pub struct AuthClient {
    config: ProviderConfig,
    http: reqwest::Client,
}

/// Hosted-login URL together with the `state` value it carries.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Token response from the provider token endpoint.
///
/// Used only to fetch user info within the callback request; never persisted.
#[derive(Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub token_type: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_id_token", &self.id_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// User info from the provider userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct UserInfo {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl UserInfo {
    /// Create a new `UserInfo` with only the required `sub` field.
    #[must_use]
    pub fn new(sub: impl Into<String>) -> Self {
        Self {
            sub: sub.into(),
            email: None,
            email_verified: None,
            name: None,
            username: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name to show for this principal: `name`, else `username`, else `email`, else `sub`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }
}

// The provider reports `email_verified` as the string "true"/"false".
fn bool_or_string<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => match s.as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "invalid email_verified value: {other}"
            ))),
        },
    }
}

impl AuthClient {
    /// Create a client with a bounded per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ProviderConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Hosted-login URL for a fresh, unpredictable `state`.
    #[must_use]
    pub fn authorization_request(&self) -> AuthorizationRequest {
        let state = csrf::generate_state();
        AuthorizationRequest {
            url: self.login_url(&state).into(),
            state,
        }
    }

    /// Hosted-login URL for the given `state`. Deterministic.
    #[must_use]
    pub fn login_url(&self, state: &str) -> Url {
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.endpoint(&["login"]);
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str())
            .append_pair("state", state)
            .append_pair("scope", &scope);
        url
    }

    /// Hosted-logout URL sending the browser back to `request_host` afterwards.
    ///
    /// Plain `http` is only used for loopback hosts.
    #[must_use]
    pub fn logout_url(&self, request_host: &str) -> Url {
        let scheme = if is_loopback_host(request_host) {
            "http"
        } else {
            "https"
        };
        let logout_uri = format!("{scheme}://{request_host}");

        let mut url = self.config.endpoint(&["logout"]);
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("logout_uri", &logout_uri);
        url
    }

    /// Exchange an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on network failure or malformed JSON, or
    /// [`Error::UpstreamAuth`] if the token endpoint returns an error status.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(self.config.token_url())
            .form(&params)
            .send()
            .await?;

        let response = Self::ensure_success(response, "token exchange").await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }

    /// Fetch user info using an access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] on network failure or malformed JSON, or
    /// [`Error::UpstreamAuth`] if the userinfo endpoint returns an error status.
    pub async fn get_user_info(&self, access_token: &str) -> Result<UserInfo, Error> {
        let response = self
            .http
            .get(self.config.userinfo_url())
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::ensure_success(response, "userinfo request").await?;
        response.json::<UserInfo>().await.map_err(Into::into)
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = read_error_body(response).await;
        Err(Error::UpstreamAuth {
            operation,
            status,
            body,
        })
    }
}

/// Upstream error bodies are kept (and logged) up to this many bytes.
const MAX_ERROR_BODY_BYTES: usize = 4096;

async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut bytes = Vec::new();
    while bytes.len() <= MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => bytes.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    truncate_error_body(&bytes)
}

fn truncate_error_body(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_ERROR_BODY_BYTES {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut body = String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY_BYTES]).into_owned();
    body.push_str("...");
    body
}

/// Whether `host` (optionally with a port) names a loopback/development address.
#[must_use]
pub fn is_loopback_host(host: &str) -> bool {
    let name = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.split(':').next().unwrap_or(host)
    };

    name.eq_ignore_ascii_case("localhost")
        || name.to_ascii_lowercase().ends_with(".localhost")
        || name.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig::new(
            "test-client",
            "test-secret",
            "https://pool.auth.example.com".parse().unwrap(),
            "https://example.com/auth/callback".parse().unwrap(),
        )
    }

    #[test]
    fn test_endpoints_under_base_url() {
        let config = test_config();
        assert_eq!(
            config.token_url().as_str(),
            "https://pool.auth.example.com/oauth2/token"
        );
        assert_eq!(
            config.userinfo_url().as_str(),
            "https://pool.auth.example.com/oauth2/userInfo"
        );
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let config = ProviderConfig::new(
            "c",
            "s",
            "http://127.0.0.1:9000/pool/".parse().unwrap(),
            "http://localhost/cb".parse().unwrap(),
        );
        assert_eq!(
            config.token_url().as_str(),
            "http://127.0.0.1:9000/pool/oauth2/token"
        );
    }

    #[test]
    fn test_login_url_is_deterministic() {
        let client = AuthClient::new(test_config()).unwrap();
        let url = client.login_url("fixed-state");

        assert_eq!(url, client.login_url("fixed-state"));
        assert_eq!(url.path(), "/login");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("response_type".into(), "code".into()),
                ("client_id".into(), "test-client".into()),
                ("redirect_uri".into(), "https://example.com/auth/callback".into()),
                ("state".into(), "fixed-state".into()),
                ("scope".into(), "openid email profile".into()),
            ]
        );
    }

    #[test]
    fn test_authorization_request_state_unique_per_call() {
        let client = AuthClient::new(test_config()).unwrap();
        let req1 = client.authorization_request();
        let req2 = client.authorization_request();

        assert_ne!(req1.state, req2.state);
        assert!(req1.url.contains(&format!("state={}", req1.state)));
    }

    #[test]
    fn test_logout_url_uses_https_for_public_hosts() {
        let client = AuthClient::new(test_config()).unwrap();
        let url = client.logout_url("app.example.com");

        assert_eq!(url.path(), "/logout");
        let logout_uri = url
            .query_pairs()
            .find(|(k, _)| k == "logout_uri")
            .map(|(_, v)| v.into_owned());
        assert_eq!(logout_uri.as_deref(), Some("https://app.example.com"));
    }

    #[test]
    fn test_logout_url_uses_http_for_loopback() {
        let client = AuthClient::new(test_config()).unwrap();
        let url = client.logout_url("localhost:8080");

        let logout_uri = url
            .query_pairs()
            .find(|(k, _)| k == "logout_uri")
            .map(|(_, v)| v.into_owned());
        assert_eq!(logout_uri.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_loopback_detection() {
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("LOCALHOST:3000"));
        assert!(is_loopback_host("127.0.0.1:8080"));
        assert!(is_loopback_host("[::1]:8080"));
        assert!(is_loopback_host("app.localhost"));
        assert!(!is_loopback_host("localhost.example.com"));
        assert!(!is_loopback_host("10.0.0.5"));
        assert!(!is_loopback_host("example.com"));
    }

    #[test]
    fn test_secret_not_in_debug() {
        let debug = format!("{:?}", test_config());
        assert!(!debug.contains("test-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_userinfo_accepts_string_email_verified() {
        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"u-1","email":"a@b.c","email_verified":"true","name":"A","username":"a"}"#,
        )
        .unwrap();
        assert_eq!(info.email_verified, Some(true));

        let info: UserInfo =
            serde_json::from_str(r#"{"sub":"u-1","email_verified":false}"#).unwrap();
        assert_eq!(info.email_verified, Some(false));
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(UserInfo::new("u-1").with_name("Ann").display_name(), "Ann");
        assert_eq!(
            UserInfo::new("u-1").with_username("ann").display_name(),
            "ann"
        );
        assert_eq!(
            UserInfo::new("u-1").with_email("ann@x.io").display_name(),
            "ann@x.io"
        );
        assert_eq!(UserInfo::new("u-1").display_name(), "u-1");
    }

    #[test]
    fn test_token_response_optional_fields() {
        let tokens: TokenResponse = serde_json::from_str(
            r#"{"access_token":"tok1","expires_in":3600,"token_type":"Bearer"}"#,
        )
        .unwrap();
        assert_eq!(tokens.access_token, "tok1");
        assert_eq!(tokens.expires_in, Some(3600));
        assert!(tokens.id_token.is_none());
        assert!(!format!("{tokens:?}").contains("tok1"));
    }

    #[test]
    fn test_short_error_body_is_kept() {
        assert_eq!(
            truncate_error_body(br#"{"error":"invalid_grant"}"#),
            r#"{"error":"invalid_grant"}"#
        );
    }

    #[test]
    fn test_long_error_body_is_truncated() {
        let body = truncate_error_body(&vec![b'x'; MAX_ERROR_BODY_BYTES * 8]);

        assert_eq!(body.len(), MAX_ERROR_BODY_BYTES + 3);
        assert!(body.ends_with("..."));
    }
}
