use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Key;

use super::error::AuthError;
use super::session::Session;
use super::state::AuthState;
use crate::types::Identity;

/// Authenticated identity attached to the request by a guard.
///
/// Use as an Axum extractor in handlers behind [`require_auth`] or
/// [`require_capability`]. Returns `401 Unauthorized` if no guard ran.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(AuthUser(identity): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}", identity.display_name)
/// }
///
/// let app = Router::new()
///     .route("/user", get(profile))
///     .route_layer(axum::middleware::from_fn_with_state(auth.clone(), require_auth));
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or(AuthError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for Session
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthState::from_ref(state);
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, &auth).await?;
        Ok(Session::load(jar, &auth.settings))
    }
}

/// Authorization predicate evaluated on an authenticated identity.
pub trait Capability: Send + Sync + 'static {
    fn permits(&self, identity: &Identity) -> bool;
}

impl<F> Capability for F
where
    F: Fn(&Identity) -> bool + Send + Sync + 'static,
{
    fn permits(&self, identity: &Identity) -> bool {
        self(identity)
    }
}

/// Placeholder role check: the display name contains `marker`.
///
/// Swap for a real authorization lookup; the guard only sees [`Capability`].
#[must_use]
pub fn name_contains(marker: impl Into<String>) -> impl Capability {
    let marker = marker.into();
    move |identity: &Identity| identity.display_name.contains(&marker)
}

/// State for [`require_capability`].
#[derive(Clone)]
pub struct CapabilityGuard {
    auth: AuthState,
    capability: Arc<dyn Capability>,
}

impl CapabilityGuard {
    #[must_use]
    pub fn new(auth: AuthState, capability: impl Capability) -> Self {
        Self {
            auth,
            capability: Arc::new(capability),
        }
    }
}

impl FromRef<CapabilityGuard> for AuthState {
    fn from_ref(guard: &CapabilityGuard) -> Self {
        guard.auth.clone()
    }
}

/// Reject anonymous requests with `401`; otherwise attach the [`Identity`].
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] when the session holds no valid identity.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticated(&session, &request)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Like [`require_auth`], and additionally reject with `403` when the
/// guard's [`Capability`] does not permit the identity.
///
/// # Errors
///
/// Returns [`AuthError::Unauthorized`] or [`AuthError::Forbidden`].
pub async fn require_capability(
    State(guard): State<CapabilityGuard>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = authenticated(&session, &request)?;
    if !guard.capability.permits(&identity) {
        tracing::info!(
            subject = %identity.subject,
            path = %request.uri().path(),
            "Capability check failed"
        );
        return Err(AuthError::Forbidden);
    }
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn authenticated(session: &Session, request: &Request) -> Result<Identity, AuthError> {
    session.identity().ok_or_else(|| {
        tracing::debug!(path = %request.uri().path(), "Rejecting anonymous request");
        AuthError::Unauthorized
    })
}
