//! Hosted-UI login, cookie sessions and route guards for Axum.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use axum::{Router, middleware::from_fn_with_state, routing::get};
//! use userpool_auth::middleware::{AuthConfig, AuthState, auth_routes, require_auth};
//!
//! // 1. Configure from environment (fatal on error at startup)
//! let auth = AuthState::new(AuthConfig::from_env()?);
//!
//! // 2. Mount /login, /auth/callback and /logout
//! // 3. Guard protected routes
//! let app = Router::new()
//!     .route("/user", get(user_page))
//!     .route_layer(from_fn_with_state(auth.clone(), require_auth))
//!     .merge(auth_routes(auth));
//! ```

mod config;
mod cookies;
mod error;
pub mod flow;
mod guard;
mod routes;
mod session;
mod state;

pub use config::{AuthConfig, MAX_SESSION_TTL_DAYS};
pub use error::{AuthError, SessionError};
pub use flow::AuthStatus;
pub use guard::{
    AuthUser, Capability, CapabilityGuard, name_contains, require_auth, require_capability,
};
pub use routes::{CALLBACK_PATH, LOGIN_PATH, LOGOUT_PATH, auth_routes};
pub use session::{IDENTITY_KEY, Session};
pub use state::AuthState;

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
