use std::collections::HashMap;

use serde_json::json;
use wiremock::matchers::body_string_contains;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;

pub fn dashamail_ok() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "response": {
            "msg": { "err_code": 0, "text": "OK" },
            "data": { "transaction_id": "t-1" }
        }
    }))
}

/// Test the `/subscriptions` endpoint with invalid requests (missing/invalid
/// fields)
#[tokio::test]
async fn subscribe_invalid() {
    let app = spawn_app().await;
    app.configure_dashamail().await;

    for (body, msg) in [
        ("", "null"),
        ("name=john", "null email"),
        ("email=foo%40bar.com", "null name"),
        ("name=&email=foo%40bar.com", "empty name"),
        ("name=john&email=", "empty email"),
        ("name=john&email=not-an-email", "invalid email"),
        ("name=%3Cscript%3E&email=foo%40bar.com", "forbidden characters"),
    ] {
        let resp = app.post_subscriptions(body.to_owned()).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
    }
    assert!(app
        .email_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
}

/// No provider, no request: the endpoint reports the service as unavailable
#[tokio::test]
async fn subscribe_unconfigured() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .respond_with(dashamail_ok())
        .expect(0)
        .mount(&app.email_server)
        .await;

    let resp = app
        .post_subscriptions("name=Ivan&email=user%40test.ru".to_owned())
        .await;
    assert_eq!(resp.status().as_u16(), 503);
}

#[tokio::test]
async fn subscribe_sends_confirmation_email() {
    let app = spawn_app().await;
    app.configure_dashamail().await;

    Mock::given(path("/"))
        .and(method("POST"))
        .and(body_string_contains("method=transactional.send"))
        .respond_with(dashamail_ok())
        .expect(1)
        .mount(&app.email_server)
        .await;

    let resp = app
        .post_subscriptions("name=%D0%98%D0%B2%D0%B0%D0%BD&email=user%40test.ru".to_owned())
        .await;
    assert_eq!(resp.status().as_u16(), 200);

    let reqs = app.email_server.received_requests().await.unwrap();
    let form: HashMap<String, String> = serde_urlencoded::from_bytes(&reqs[0].body).unwrap();
    assert_eq!(form["to"], "user@test.ru");
    assert_eq!(form["subject"], "Подтвердите подписку на рассылку SecureLex.ru");
    assert_eq!(form["from_email"], "noreply@securelex.ru");

    let links = app.get_confirmation_links(&reqs[0]);
    assert_eq!(links.html.path(), "/subscriptions/confirm");
    assert!(links
        .html
        .query_pairs()
        .any(|(k, _)| k == "subscription_token"));
}

#[tokio::test]
async fn subscribe_uses_custom_template() {
    let app = spawn_app().await;
    app.put_email_settings(&json!({
        "provider": "dashamail",
        "is_active": true,
        "api_key": "dasha-key",
        "sender_email": "noreply@securelex.ru",
        "sender_name": "SecureLex.ru",
        "confirmation_subject": "Confirm",
        "confirmation_template": "<p><a href=\"{{confirmUrl}}\">go</a></p>",
    }))
    .await
    .error_for_status()
    .unwrap();

    Mock::given(path("/"))
        .and(method("POST"))
        .respond_with(dashamail_ok())
        .expect(1)
        .mount(&app.email_server)
        .await;

    app.post_subscriptions("name=Ivan&email=user%40test.ru".to_owned())
        .await
        .error_for_status()
        .unwrap();

    let reqs = app.email_server.received_requests().await.unwrap();
    let form: HashMap<String, String> = serde_urlencoded::from_bytes(&reqs[0].body).unwrap();
    assert_eq!(form["subject"], "Confirm");
    assert!(form["message"].starts_with("<p><a href=\"http://127.0.0.1/subscriptions/confirm?"));
    assert!(!form["message"].contains("{{confirmUrl}}"));
}

#[tokio::test]
async fn subscribe_provider_rejection_is_500() {
    let app = spawn_app().await;
    app.configure_dashamail().await;

    Mock::given(path("/"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": { "msg": { "err_code": 4, "text": "Invalid from_email" } }
        })))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let resp = app
        .post_subscriptions("name=Ivan&email=user%40test.ru".to_owned())
        .await;
    assert_eq!(resp.status().as_u16(), 500);
}

/// Vendor transport failures are reported, not panicked on
#[tokio::test]
async fn subscribe_vendor_outage_is_500() {
    let app = spawn_app().await;
    app.configure_dashamail().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let resp = app
        .post_subscriptions("name=Ivan&email=user%40test.ru".to_owned())
        .await;
    assert_eq!(resp.status().as_u16(), 500);
}
