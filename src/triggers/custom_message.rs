use url::Url;

use super::events::{CustomMessageEvent, TriggerSource};

/// Substituted with the verification code by the provider when the message is sent.
pub const CODE_PLACEHOLDER: &str = "{####}";

const DEFAULT_SUBJECT: &str = "Please verify your email";
const DEFAULT_BODY: &str = "
<p>Verification code: {####}</p>

<p>Thank you for signing up.</p>

";

/// Subject and body used for the signup verification email.
#[derive(Debug, Clone)]
pub struct VerificationMessage {
    subject: String,
    body: String,
    link_base: Option<Url>,
}

impl Default for VerificationMessage {
    fn default() -> Self {
        Self {
            subject: DEFAULT_SUBJECT.into(),
            body: DEFAULT_BODY.into(),
            link_base: None,
        }
    }
}

impl VerificationMessage {
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Replace the body. It should contain [`CODE_PLACEHOLDER`].
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Append a verification link, e.g. a deep link into a mobile app:
    /// `<base>?code={####}&user=<username>`.
    #[must_use]
    pub fn with_link_base(mut self, base: Url) -> Self {
        self.link_base = Some(base);
        self
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Body for `username`, with the link appended when configured.
    #[must_use]
    pub fn body_for(&self, username: &str) -> String {
        match self.verification_link(username) {
            Some(link) => format!(
                "{}<p><a href=\"{link}\">Verify your email</a></p>\n",
                self.body
            ),
            None => self.body.clone(),
        }
    }

    // The placeholder must stay literal, so the query is not form-encoded.
    fn verification_link(&self, username: &str) -> Option<String> {
        let base = self.link_base.as_ref()?;
        let separator = if base.query().is_some() { '&' } else { '?' };
        Some(format!(
            "{base}{separator}code={CODE_PLACEHOLDER}&user={}",
            urlencoding::encode(username)
        ))
    }
}

/// Handle a custom-message trigger with the default template.
#[must_use]
pub fn handle_custom_message(event: CustomMessageEvent) -> CustomMessageEvent {
    handle_custom_message_with(&VerificationMessage::default(), event)
}

/// Overwrite the email subject/body for signup verification messages.
///
/// Every other trigger source is returned exactly as received.
#[must_use]
pub fn handle_custom_message_with(
    template: &VerificationMessage,
    mut event: CustomMessageEvent,
) -> CustomMessageEvent {
    if !event
        .trigger_source
        .is(TriggerSource::CUSTOM_MESSAGE_SIGN_UP)
    {
        return event;
    }

    tracing::info!(
        username = %event.user_name,
        user_pool_id = event.user_pool_id.get().map(String::as_str).unwrap_or_default(),
        "Building signup verification message"
    );

    let mut response = std::mem::take(&mut event.response).unwrap_or_default();
    response.email_subject = template.subject().to_string().into();
    response.email_message = template.body_for(&event.user_name).into();
    event.response = response.into();
    event
}
