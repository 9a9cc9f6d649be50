//! `EmailSubscriptionService` driven directly, without the HTTP layer.

use std::collections::HashMap;

use secrecy::Secret;
use securelex_mailer::email::ConfigurationState;
use securelex_mailer::email::EmailProviderKind;
use securelex_mailer::email::EmailServiceSettings;
use securelex_mailer::email::EmailSubscriptionService;
use securelex_mailer::email::ProviderEndpoints;
use securelex_mailer::email::LIST_NOT_CONFIGURED;
use securelex_mailer::email::NOT_CONFIGURED;
use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

fn service(server: &MockServer) -> EmailSubscriptionService {
    EmailSubscriptionService::new(
        reqwest::Client::new(),
        ProviderEndpoints {
            sendpulse: server.uri(),
            unisender: server.uri(),
            dashamail: server.uri(),
        },
    )
}

fn settings(
    provider: EmailProviderKind,
    list_id: Option<&str>,
) -> EmailServiceSettings {
    EmailServiceSettings {
        provider,
        is_active: true,
        api_key: Some(Secret::new("key".to_string())),
        api_secret: Some(Secret::new("secret".to_string())),
        list_id: list_id.map(str::to_string),
        sender_email: "noreply@securelex.ru".to_string(),
        sender_name: "SecureLex.ru".to_string(),
        ..Default::default()
    }
}

fn form(req: &wiremock::Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&req.body).unwrap()
}

#[tokio::test]
async fn dashamail_add_to_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("method=lists.add_member"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "msg": { "err_code": 0, "text": "OK" }, "data": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    let state = service.configure(settings(EmailProviderKind::Dashamail, Some("7")));
    assert_eq!(state, ConfigurationState::Active(EmailProviderKind::Dashamail));

    let result = service
        .add_subscriber_to_list("user@test.ru", Some("Ivan"))
        .await;
    assert!(result.success, "{result:?}");
    assert_eq!(result.error, None);

    let reqs = server.received_requests().await.unwrap();
    let sent = form(&reqs[0]);
    assert_eq!(sent["method"], "lists.add_member");
    assert_eq!(sent["api_key"], "key");
    assert_eq!(sent["list_id"], "7");
    assert_eq!(sent["email"], "user@test.ru");
    assert_eq!(sent["merge"], r#"{"Name":"Ivan"}"#);
    assert_eq!(sent["update"], "1");
}

#[tokio::test]
async fn unconfigured_service_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service(&server);
    assert!(!service.is_configured());
    assert_eq!(service.state(), ConfigurationState::Unconfigured);

    let sent = service
        .send_confirmation_email("user@test.ru", "https://securelex.ru/c")
        .await;
    assert!(!sent.success);
    assert_eq!(sent.error.as_deref(), Some(NOT_CONFIGURED));

    let welcome = service.send_welcome_email("user@test.ru").await;
    assert_eq!(welcome.error.as_deref(), Some(NOT_CONFIGURED));

    let added = service.add_subscriber_to_list("user@test.ru", None).await;
    assert_eq!(added.error.as_deref(), Some(NOT_CONFIGURED));
}

#[tokio::test]
async fn missing_list_id_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let service = service(&server);
    service.configure(settings(EmailProviderKind::Unisender, Some("  ")));
    assert!(service.is_configured());

    let added = service
        .add_subscriber_to_list("user@test.ru", Some("Ivan"))
        .await;
    assert!(!added.success);
    assert_eq!(added.error.as_deref(), Some(LIST_NOT_CONFIGURED));
}

#[tokio::test]
async fn sendpulse_token_is_shared_between_emails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 3600,
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/smtp/emails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true })))
        .expect(2)
        .mount(&server)
        .await;

    let service = service(&server);
    service.configure(settings(EmailProviderKind::SendPulse, None));

    let confirm = service
        .send_confirmation_email("user@test.ru", "https://securelex.ru/c")
        .await;
    assert!(confirm.success, "{confirm:?}");
    let welcome = service.send_welcome_email("user@test.ru").await;
    assert!(welcome.success, "{welcome:?}");
}

#[tokio::test]
async fn unisender_subscribe_returns_person_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subscribe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "person_id": 42 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    service.configure(settings(EmailProviderKind::Unisender, Some("3")));

    let added = service.add_subscriber_to_list("user@test.ru", None).await;
    assert!(added.success, "{added:?}");
    assert_eq!(added.external_id.as_deref(), Some("42"));

    let reqs = server.received_requests().await.unwrap();
    let sent = form(&reqs[0]);
    assert_eq!(sent["list_ids"], "3");
    assert!(!sent.contains_key("fields[Name]"));
}

#[tokio::test]
async fn reconfigure_switches_provider() {
    let server = MockServer::start().await;
    Mock::given(path("/sendEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{ "index": 0, "email": "user@test.ru", "id": "1" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path("/"))
        .and(body_string_contains("method=transactional.send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "msg": { "err_code": 0, "text": "OK" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    service.configure(settings(EmailProviderKind::Unisender, None));
    assert!(service.send_welcome_email("user@test.ru").await.success);

    service.configure(settings(EmailProviderKind::Dashamail, None));
    assert!(service.send_welcome_email("user@test.ru").await.success);

    let state = service.configure(EmailServiceSettings::default());
    assert_eq!(state, ConfigurationState::Disabled);
    assert!(!service.send_welcome_email("user@test.ru").await.success);
}

#[tokio::test]
async fn custom_welcome_template_is_sent_as_is() {
    let server = MockServer::start().await;
    Mock::given(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "msg": { "err_code": 0, "text": "OK" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    service.configure(EmailServiceSettings {
        welcome_template: Some("<p>{{confirmUrl}} stays</p>".to_string()),
        welcome_subject: Some("Hi".to_string()),
        ..settings(EmailProviderKind::Dashamail, None)
    });
    assert!(service.send_welcome_email("user@test.ru").await.success);

    let reqs = server.received_requests().await.unwrap();
    let sent = form(&reqs[0]);
    assert_eq!(sent["message"], "<p>{{confirmUrl}} stays</p>");
    assert_eq!(sent["subject"], "Hi");
    assert_eq!(sent["from_name"], "SecureLex.ru");
}
