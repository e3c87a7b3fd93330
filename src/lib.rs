#![doc = include_str!("../README.md")]

#[cfg(feature = "middleware")]
pub mod app;
pub mod csrf;
pub mod error;
#[cfg(feature = "middleware")]
pub mod middleware;
pub mod oauth;
#[cfg(feature = "triggers")]
pub mod triggers;
pub mod types;

// Re-exports for convenient access
pub use csrf::generate_state;
pub use error::Error;
pub use oauth::{AuthClient, AuthorizationRequest, ProviderConfig, TokenResponse, UserInfo};
pub use types::{Identity, Subject};
