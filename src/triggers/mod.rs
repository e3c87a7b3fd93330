//! Identity provider signup lifecycle triggers.
//!
//! Each handler maps an inbound event to the event the provider expects back.
//! Delivery is at-least-once with no ordering between triggers, so handlers
//! only act on their own trigger source and pass every other event through
//! unchanged.

mod custom_message;
mod events;
mod post_confirmation;

pub use custom_message::{
    CODE_PLACEHOLDER, VerificationMessage, handle_custom_message, handle_custom_message_with,
};
pub use events::{
    CallerContext, CustomMessageEvent, CustomMessageRequest, CustomMessageResponse, Field,
    PostConfirmationEvent, PostConfirmationRequest, PostConfirmationResponse, TriggerEvent,
    TriggerSource,
};
pub use post_confirmation::{
    InMemoryProvisioner, ProvisionError, ProvisionedUser, TriggerError, UserProvisioner,
    handle_post_confirmation,
};
