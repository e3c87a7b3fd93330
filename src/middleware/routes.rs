use axum::Router;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::response::Redirect;
use axum::routing::get;
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use super::cookies;
use super::error::AuthError;
use super::flow::{self, CallbackInput, LoginStep};
use super::session::Session;
use super::state::AuthState;

pub const LOGIN_PATH: &str = "/login";
pub const CALLBACK_PATH: &str = "/auth/callback";
pub const LOGOUT_PATH: &str = "/logout";

/// Create the login/callback/logout router.
///
/// The provider must be configured with `<origin>/auth/callback` as redirect URI.
pub fn auth_routes(state: AuthState) -> Router {
    Router::new()
        .route(LOGIN_PATH, get(login))
        .route(CALLBACK_PATH, get(callback))
        .route(LOGOUT_PATH, get(logout))
        .with_state(state)
}

// ── Login ──────────────────────────────────────────────────────────

async fn login(State(state): State<AuthState>, session: Session) -> (PrivateCookieJar, Redirect) {
    match flow::begin_login(&session, &state.client) {
        LoginStep::AlreadyAuthenticated => (
            session.into_jar(),
            Redirect::temporary(&state.settings.login_redirect),
        ),
        LoginStep::RedirectToProvider { url, state: csrf } => {
            let cookie = cookies::state_cookie(&csrf, state.settings.secure_cookies);
            (session.into_jar().add(cookie), Redirect::temporary(&url))
        }
    }
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback(
    State(state): State<AuthState>,
    session: Session,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(PrivateCookieJar, Redirect), AuthError> {
    let expected_state = cookies::get_state(&jar);
    let input = CallbackInput {
        code: params.code.as_deref(),
        state: params.state.as_deref(),
        expected_state: expected_state.as_deref(),
        provider_error: params
            .error
            .as_deref()
            .map(|e| (e, params.error_description.as_deref())),
    };
    let code = flow::validate_callback(&input)?;

    let identity = flow::complete_callback(&state.client, code).await?;

    let session = session.set_identity(&identity).map_err(|e| {
        tracing::error!(error = %e, subject = %identity.subject, "Session write failed");
        AuthError::Session(e)
    })?;

    let jar = session.into_jar().remove(cookies::clear_state_cookie());

    Ok((jar, Redirect::temporary(&state.settings.login_redirect)))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(
    State(state): State<AuthState>,
    session: Session,
    headers: HeaderMap,
) -> (PrivateCookieJar, Redirect) {
    let host = request_host(&headers, &state);
    let (session, url) = flow::logout(session, &state.client, &host);
    (session.into_jar(), Redirect::temporary(url.as_str()))
}

// ── Helpers ────────────────────────────────────────────────────────

fn request_host(headers: &HeaderMap, state: &AuthState) -> String {
    headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            let redirect = state.client.config().redirect_uri();
            match (redirect.host_str(), redirect.port()) {
                (Some(host), Some(port)) => format!("{host}:{port}"),
                (Some(host), None) => host.to_string(),
                (None, _) => "localhost".to_string(),
            }
        })
}
