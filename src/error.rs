/// Failures talking to the identity provider.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The provider answered with a non-success status.
    ///
    /// Authorization codes are single-use, so these are never retried.
    #[error("{operation} returned status {status}: {body}")]
    UpstreamAuth {
        operation: &'static str,
        status: u16,
        body: String,
    },
    /// Network failure, timeout, or a response body that is not the expected JSON.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    /// Upstream HTTP status, when the provider produced one.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::UpstreamAuth { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}
