//! Login/logout transitions.
//!
//! `Anonymous --login--> PendingCallback --callback(code)--> Authenticated --logout--> Anonymous`.
//! `PendingCallback` only exists inside the callback request; nothing about it
//! is persisted except the short-lived `state` cookie.

use url::Url;

use super::error::AuthError;
use super::session::Session;
use crate::oauth::AuthClient;
use crate::types::Identity;

/// Persisted authentication status of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Anonymous,
    Authenticated(Identity),
}

impl AuthStatus {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        session
            .identity()
            .map_or(Self::Anonymous, Self::Authenticated)
    }
}

/// Outcome of a login request.
#[derive(Debug)]
pub enum LoginStep {
    /// A valid identity is already present; go home without contacting the provider.
    AlreadyAuthenticated,
    /// Send the browser to the hosted login page; `state` must come back on the callback.
    RedirectToProvider { url: String, state: String },
}

/// `Anonymous -> PendingCallback`, or a no-op when already authenticated.
#[must_use]
pub fn begin_login(session: &Session, client: &AuthClient) -> LoginStep {
    if let AuthStatus::Authenticated(identity) = AuthStatus::of(session) {
        tracing::debug!(subject = %identity.subject, "Login requested with an active session");
        return LoginStep::AlreadyAuthenticated;
    }

    let request = client.authorization_request();
    LoginStep::RedirectToProvider {
        url: request.url,
        state: request.state,
    }
}

/// Validated inputs of a callback request.
#[derive(Debug)]
pub struct CallbackInput<'a> {
    pub code: Option<&'a str>,
    pub state: Option<&'a str>,
    pub expected_state: Option<&'a str>,
    pub provider_error: Option<(&'a str, Option<&'a str>)>,
}

/// Reject callbacks that must never reach the provider. Returns the code.
///
/// # Errors
///
/// Returns [`AuthError::InvalidRequest`] if the provider reported an error,
/// the code is missing or empty, or `state` does not match the one issued at login.
pub fn validate_callback<'a>(input: &CallbackInput<'a>) -> Result<&'a str, AuthError> {
    if let Some((error, description)) = input.provider_error {
        let description = description.unwrap_or("Unknown error");
        tracing::warn!(error, description, "OAuth2 error from identity provider");
        return Err(AuthError::InvalidRequest(description.to_string()));
    }

    let code = input.code.filter(|c| !c.is_empty()).ok_or_else(|| {
        tracing::warn!("Callback without authorization code");
        AuthError::InvalidRequest("No authorization code provided".into())
    })?;

    match (input.state, input.expected_state) {
        (Some(received), Some(expected)) if received == expected => Ok(code),
        _ => {
            tracing::warn!("OAuth state mismatch");
            Err(AuthError::InvalidRequest("State mismatch".into()))
        }
    }
}

/// `PendingCallback -> Authenticated`: code → tokens → user info → identity.
///
/// Nothing is written here; the caller commits the returned identity, so a
/// failure at any step leaves the session untouched.
///
/// # Errors
///
/// Returns [`AuthError::Provider`] if the token exchange or userinfo call fails.
pub async fn complete_callback(client: &AuthClient, code: &str) -> Result<Identity, AuthError> {
    let tokens = client.exchange_code(code).await.map_err(|e| {
        tracing::error!(
            step = "token exchange",
            error = %e,
            upstream_status = ?e.upstream_status(),
            "Token exchange failed"
        );
        AuthError::Provider(e)
    })?;

    let user_info = client
        .get_user_info(&tokens.access_token)
        .await
        .map_err(|e| {
            tracing::error!(
                step = "userinfo",
                error = %e,
                upstream_status = ?e.upstream_status(),
                "Userinfo request failed"
            );
            AuthError::Provider(e)
        })?;

    let identity = Identity::from(&user_info);
    tracing::info!(
        subject = %identity.subject,
        username = user_info.username.as_deref().unwrap_or_default(),
        "Identity provider login completed"
    );
    Ok(identity)
}

/// `Authenticated -> Anonymous`: expire the session and point at the hosted logout page.
#[must_use]
pub fn logout(session: Session, client: &AuthClient, request_host: &str) -> (Session, Url) {
    if let AuthStatus::Authenticated(identity) = AuthStatus::of(&session) {
        tracing::info!(subject = %identity.subject, "Logging out");
    }
    (session.invalidate(), client.logout_url(request_host))
}
