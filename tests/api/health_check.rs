use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check() {
    let app = spawn_app().await;

    let resp = app
        .api_client
        .get(format!("{}/health_check", app.addr))
        .send()
        .await
        .expect("execute request");
    assert!(resp.status().is_success());
    assert_eq!(resp.content_length().unwrap(), 0); // empty body
}

/// An unconfigured email service is not an outage
#[tokio::test]
async fn health_check_ignores_email_service() {
    let app = spawn_app().await;

    let resp = reqwest::get(format!("{}/health_check", app.addr))
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    assert!(app
        .email_server
        .received_requests()
        .await
        .unwrap()
        .is_empty());
}
