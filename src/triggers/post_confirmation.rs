use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use super::events::{PostConfirmationEvent, TriggerSource};

/// Application-side user provisioning.
///
/// Called once a signup is confirmed at the provider. Redelivery is expected,
/// so an existing user must be reported as [`ProvisionError::AlreadyExists`],
/// never as a generic failure.
pub trait UserProvisioner: Send + Sync {
    /// Create the application user keyed by `username`.
    fn create_user(
        &self,
        username: &str,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<(), ProvisionError>> + Send;

    /// Push application-owned attributes back to the provider, if any.
    ///
    /// Runs after creation and after a duplicate, so it must be idempotent.
    fn sync_attributes(
        &self,
        _username: &str,
    ) -> impl Future<Output = Result<(), ProvisionError>> + Send {
        async { Ok(()) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("user {0} already exists")]
    AlreadyExists(String),
    #[error("provisioning failed: {0}")]
    Failed(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors reported back to the provider, which then redelivers the event.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("provisioning user {username} failed: {source}")]
    Provisioning {
        username: String,
        #[source]
        source: ProvisionError,
    },
}

/// Provision the application user for a confirmed signup.
///
/// Only `PostConfirmation_ConfirmSignUp` is acted on; password-reset
/// confirmations and anything else pass through. The user's signup has
/// already completed when this runs, so an error only triggers a retry.
///
/// # Errors
///
/// Returns [`TriggerError::Provisioning`] when creation (other than a
/// duplicate) or attribute sync fails.
pub async fn handle_post_confirmation<P: UserProvisioner>(
    provisioner: &P,
    event: PostConfirmationEvent,
) -> Result<PostConfirmationEvent, TriggerError> {
    if !event
        .trigger_source
        .is(TriggerSource::POST_CONFIRMATION_SIGN_UP)
    {
        return Ok(event);
    }

    let username = event.user_name.as_str();
    let no_attributes = HashMap::new();
    let attributes = event.request.user_attributes.get().unwrap_or(&no_attributes);
    tracing::info!(
        user_pool_id = event.user_pool_id.get().map(String::as_str).unwrap_or_default(),
        username,
        email = attributes.get("email").map(String::as_str).unwrap_or_default(),
        sub = attributes.get("sub").map(String::as_str).unwrap_or_default(),
        "Provisioning confirmed user"
    );

    match provisioner.create_user(username, attributes).await {
        Ok(()) => tracing::info!(username, "Created application user"),
        Err(ProvisionError::AlreadyExists(_)) => {
            tracing::info!(username, "User already provisioned, treating redelivery as success");
        }
        Err(source) => {
            tracing::error!(username, error = %source, "Failed to create user");
            return Err(TriggerError::Provisioning {
                username: username.to_string(),
                source,
            });
        }
    }

    if let Err(source) = provisioner.sync_attributes(username).await {
        tracing::error!(username, error = %source, "Failed to sync user attributes");
        return Err(TriggerError::Provisioning {
            username: username.to_string(),
            source,
        });
    }

    Ok(event)
}

/// A provisioned application user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedUser {
    pub username: String,
    pub attributes: HashMap<String, String>,
}

/// Process-local [`UserProvisioner`], keyed by username.
#[derive(Debug, Default)]
pub struct InMemoryProvisioner {
    users: Mutex<HashMap<String, ProvisionedUser>>,
}

impl InMemoryProvisioner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, username: &str) -> Option<ProvisionedUser> {
        self.users.lock().ok()?.get(username).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserProvisioner for InMemoryProvisioner {
    async fn create_user(
        &self,
        username: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<(), ProvisionError> {
        let mut users = self
            .users
            .lock()
            .map_err(|e| ProvisionError::Failed(e.to_string().into()))?;

        if users.contains_key(username) {
            return Err(ProvisionError::AlreadyExists(username.to_string()));
        }
        users.insert(
            username.to_string(),
            ProvisionedUser {
                username: username.to_string(),
                attributes: attributes.clone(),
            },
        );
        Ok(())
    }
}
