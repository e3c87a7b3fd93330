use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::oauth::UserInfo;

/// Provider subject identifier (OAuth `sub` claim).
///
/// Opaque and stable for the lifetime of the provider account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct Subject(pub String);

impl Subject {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Subject {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// The authenticated principal stored in the session.
///
/// Immutable once created. Decoding rejects any extra or missing field so only
/// an exact shape is ever trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Identity {
    pub subject: Subject,
    pub display_name: String,
}

impl Identity {
    #[must_use]
    pub fn new(subject: impl Into<Subject>, display_name: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
        }
    }
}

impl From<&UserInfo> for Identity {
    fn from(info: &UserInfo) -> Self {
        Self::new(info.sub.as_str(), info.display_name())
    }
}
