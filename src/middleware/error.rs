use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Authentication errors for the middleware layer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or malformed caller input (no code, state mismatch, provider-reported error).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No valid session found.
    #[error("Not authenticated")]
    Unauthorized,

    /// Authenticated, but the capability check failed.
    #[error("Forbidden")]
    Forbidden,

    /// Token exchange or userinfo call failed.
    #[error(transparent)]
    Provider(#[from] crate::error::Error),

    /// Session payload could not be written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Session payload encode/decode failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The stored value does not have the expected shape.
    #[error("Session decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Session encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "You must be logged in to access this page",
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "You are not authorized to access this page",
            )
                .into_response(),
            Self::Provider(ref e) => {
                tracing::error!(
                    error = %e,
                    upstream_status = ?e.upstream_status(),
                    "Identity provider call failed"
                );
                (StatusCode::BAD_GATEWAY, "Authentication failed").into_response()
            }
            Self::Session(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Auth internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        let cases = [
            (AuthError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::Unauthorized, StatusCode::UNAUTHORIZED),
            (AuthError::Forbidden, StatusCode::FORBIDDEN),
            (
                AuthError::Provider(crate::error::Error::UpstreamAuth {
                    operation: "token exchange",
                    status: 400,
                    body: "invalid_grant".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AuthError::Config("missing".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
