use std::collections::HashMap;

use derive_more::{Display, From};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Trigger-source discriminant, e.g. `CustomMessage_SignUp`.
///
/// Kept as the raw string so unrecognised sources round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct TriggerSource(pub String);

impl TriggerSource {
    /// Verification message sent on signup.
    pub const CUSTOM_MESSAGE_SIGN_UP: &'static str = "CustomMessage_SignUp";
    /// Account confirmed after signup.
    pub const POST_CONFIRMATION_SIGN_UP: &'static str = "PostConfirmation_ConfirmSignUp";
    /// Account confirmed after a password reset.
    pub const POST_CONFIRMATION_FORGOT_PASSWORD: &'static str =
        "PostConfirmation_ConfirmForgotPassword";

    #[must_use]
    pub fn is(&self, source: &str) -> bool {
        self.0 == source
    }
}

impl From<&str> for TriggerSource {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Optional event field that remembers whether it was absent or `null`.
///
/// Re-serializing an event writes back exactly what was received: absent
/// fields stay absent (with `skip_serializing_if = "Field::is_absent"`) and
/// explicit `null`s stay `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Absent,
    Null,
    Present(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> Field<T> {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }

    /// The value, or `T::default()` when absent or `null`.
    #[must_use]
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        match self {
            Self::Present(value) => value,
            Self::Absent | Self::Null => T::default(),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Present(value) => value.serialize(serializer),
            Self::Absent | Self::Null => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| value.map_or(Self::Null, Self::Present))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerContext {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub aws_sdk_version: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub client_id: Field<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Envelope shared by all lifecycle triggers.
///
/// Fields this crate does not model (client metadata, link parameters, ...)
/// are kept in `extra` and written back as-is. Only `triggerSource`,
/// `userName` and `request` are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent<Req, Resp> {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub version: Field<String>,
    pub trigger_source: TriggerSource,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub region: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub user_pool_id: Field<String>,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub caller_context: Field<CallerContext>,
    pub request: Req,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub response: Field<Resp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessageRequest {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub user_attributes: Field<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub code_parameter: Field<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessageResponse {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub sms_message: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub email_message: Field<String>,
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub email_subject: Field<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConfirmationRequest {
    #[serde(default, skip_serializing_if = "Field::is_absent")]
    pub user_attributes: Field<HashMap<String, String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The provider expects an empty object back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostConfirmationResponse {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type CustomMessageEvent = TriggerEvent<CustomMessageRequest, CustomMessageResponse>;
pub type PostConfirmationEvent = TriggerEvent<PostConfirmationRequest, PostConfirmationResponse>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn custom_message_event_decodes_provider_shape() {
        let event: CustomMessageEvent = serde_json::from_value(json!({
            "version": "1",
            "triggerSource": "CustomMessage_SignUp",
            "region": "us-east-1",
            "userPoolId": "us-east-1_pool",
            "userName": "jdoe",
            "callerContext": {"awsSdkVersion": "aws-sdk-unknown-unknown", "clientId": "client-1"},
            "request": {
                "userAttributes": {"sub": "u-1", "email": "jdoe@example.com"},
                "codeParameter": "{####}",
                "usernameParameter": null,
                "linkParameter": "{##Click Here##}"
            },
            "response": {"smsMessage": null, "emailMessage": null, "emailSubject": null}
        }))
        .unwrap();

        assert!(event.trigger_source.is(TriggerSource::CUSTOM_MESSAGE_SIGN_UP));
        assert_eq!(event.user_name, "jdoe");
        let caller = event.caller_context.get().unwrap();
        assert_eq!(caller.client_id.get().map(String::as_str), Some("client-1"));
        assert_eq!(
            event.request.code_parameter.get().map(String::as_str),
            Some("{####}")
        );
        assert_eq!(event.request.extra.get("usernameParameter"), Some(&Value::Null));
        assert_eq!(
            event.request.extra.get("linkParameter"),
            Some(&json!("{##Click Here##}"))
        );
    }

    #[test]
    fn unknown_fields_survive_reserialization() {
        let raw = json!({
            "version": "1",
            "triggerSource": "PostConfirmation_ConfirmSignUp",
            "region": "eu-west-1",
            "userPoolId": "eu-west-1_pool",
            "userName": "jdoe",
            "callerContext": {"awsSdkVersion": "v", "clientId": "c", "newField": 1},
            "request": {"userAttributes": {"email": "jdoe@example.com"}, "clientMetadata": null},
            "response": {},
            "futureTopLevel": {"a": [1, 2]}
        });

        let event: PostConfirmationEvent = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn absent_and_null_fields_are_kept_apart() {
        let raw = json!({
            "triggerSource": "CustomMessage_ForgotPassword",
            "userName": "jdoe",
            "region": null,
            "request": {"codeParameter": "{####}", "userAttributes": null},
            "response": {"emailMessage": null}
        });

        let event: CustomMessageEvent = serde_json::from_value(raw.clone()).unwrap();
        assert!(event.version.is_absent());
        assert_eq!(event.region, Field::Null);
        assert!(event.caller_context.is_absent());
        assert_eq!(event.request.user_attributes, Field::Null);
        let response = event.response.get().unwrap();
        assert_eq!(response.email_message, Field::Null);
        assert!(response.sms_message.is_absent());

        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn null_response_defaults_to_empty_fields() {
        let field: Field<CustomMessageResponse> = Field::Null;
        let mut response = field.unwrap_or_default();
        response.email_subject = "Hi".to_string().into();

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"emailSubject": "Hi"}));
    }
}
