use serde_json::{Value, json};
use userpool_auth::triggers::{
    CustomMessageEvent, InMemoryProvisioner, PostConfirmationEvent, handle_custom_message,
    handle_post_confirmation,
};

fn custom_message_payload(trigger_source: &str) -> Value {
    json!({
        "version": "1",
        "triggerSource": trigger_source,
        "region": "us-east-1",
        "userPoolId": "us-east-1_pool",
        "userName": "jdoe",
        "callerContext": {
            "awsSdkVersion": "aws-sdk-unknown-unknown",
            "clientId": "client-1"
        },
        "request": {
            "userAttributes": {
                "sub": "0f1e2d3c",
                "email_verified": "false",
                "email": "jdoe@example.com"
            },
            "codeParameter": "{####}",
            "linkParameter": "{##Click Here##}",
            "usernameParameter": null
        },
        "response": {
            "smsMessage": null,
            "emailMessage": null,
            "emailSubject": null
        }
    })
}

fn post_confirmation_payload(trigger_source: &str) -> Value {
    json!({
        "version": "1",
        "triggerSource": trigger_source,
        "region": "us-east-1",
        "userPoolId": "us-east-1_pool",
        "userName": "jdoe",
        "callerContext": {
            "awsSdkVersion": "aws-sdk-unknown-unknown",
            "clientId": "client-1"
        },
        "request": {
            "userAttributes": {
                "sub": "0f1e2d3c",
                "cognito:user_status": "CONFIRMED",
                "email": "jdoe@example.com"
            }
        },
        "response": {}
    })
}

fn run_custom_message(payload: &Value) -> Value {
    let event: CustomMessageEvent = serde_json::from_value(payload.clone()).unwrap();
    serde_json::to_value(handle_custom_message(event)).unwrap()
}

#[test]
fn signup_verification_message_is_templated() {
    let out = run_custom_message(&custom_message_payload("CustomMessage_SignUp"));

    assert_eq!(
        out["response"]["emailSubject"],
        json!("Please verify your email")
    );
    let body = out["response"]["emailMessage"].as_str().unwrap();
    assert!(body.contains("{####}"));
    assert_eq!(out["response"]["smsMessage"], Value::Null);
    assert_eq!(out["request"], custom_message_payload("CustomMessage_SignUp")["request"]);
}

#[test]
fn other_custom_messages_are_returned_unchanged() {
    for source in [
        "CustomMessage_ForgotPassword",
        "CustomMessage_UpdateUserAttribute",
        "CustomMessage_VerifyUserAttribute",
        "CustomMessage_Authentication",
    ] {
        let payload = custom_message_payload(source);
        assert_eq!(run_custom_message(&payload), payload, "{source}");
    }
}

#[test]
fn minimal_custom_message_passes_through_without_added_fields() {
    let payload = json!({
        "triggerSource": "CustomMessage_ForgotPassword",
        "userName": "jdoe",
        "request": {"codeParameter": "{####}"},
        "response": {}
    });

    assert_eq!(run_custom_message(&payload), payload);
}

#[test]
fn minimal_signup_message_only_adds_email_fields() {
    let payload = json!({
        "triggerSource": "CustomMessage_SignUp",
        "userName": "jdoe",
        "request": {"codeParameter": "{####}"},
        "response": {}
    });

    let out = run_custom_message(&payload);

    let mut expected = payload.clone();
    expected["response"] = json!({
        "emailSubject": "Please verify your email",
        "emailMessage": out["response"]["emailMessage"].clone(),
    });
    assert_eq!(out, expected);
    assert!(out["response"]["emailMessage"].as_str().unwrap().contains("{####}"));
}

#[tokio::test]
async fn minimal_forgot_password_confirmation_passes_through() {
    let provisioner = InMemoryProvisioner::new();
    let payload = json!({
        "triggerSource": "PostConfirmation_ConfirmForgotPassword",
        "userName": "jdoe",
        "request": {"userAttributes": null},
        "response": {}
    });
    let event: PostConfirmationEvent = serde_json::from_value(payload.clone()).unwrap();

    let out = handle_post_confirmation(&provisioner, event).await.unwrap();

    assert_eq!(serde_json::to_value(out).unwrap(), payload);
    assert!(provisioner.is_empty());
}

#[tokio::test]
async fn post_confirmation_delivered_twice_provisions_once() {
    let provisioner = InMemoryProvisioner::new();
    let payload = post_confirmation_payload("PostConfirmation_ConfirmSignUp");

    for _ in 0..2 {
        let event: PostConfirmationEvent = serde_json::from_value(payload.clone()).unwrap();
        let out = handle_post_confirmation(&provisioner, event)
            .await
            .expect("redelivery must not surface an error");
        assert_eq!(serde_json::to_value(out).unwrap(), payload);
    }

    assert_eq!(provisioner.len(), 1);
    let user = provisioner.get("jdoe").unwrap();
    assert_eq!(user.attributes["email"], "jdoe@example.com");
}

#[tokio::test]
async fn forgot_password_confirmation_provisions_nothing() {
    let provisioner = InMemoryProvisioner::new();
    let payload = post_confirmation_payload("PostConfirmation_ConfirmForgotPassword");
    let event: PostConfirmationEvent = serde_json::from_value(payload.clone()).unwrap();

    let out = handle_post_confirmation(&provisioner, event).await.unwrap();

    assert_eq!(serde_json::to_value(out).unwrap(), payload);
    assert!(provisioner.is_empty());
}
