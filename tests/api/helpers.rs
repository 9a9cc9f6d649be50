use std::collections::HashMap;

use once_cell::sync::Lazy;
use secrecy::Secret;
use securelex_mailer::configuration::get_configuration;
use securelex_mailer::startup::Application;
use securelex_mailer::telemetry::get_subscriber;
use securelex_mailer::telemetry::init_subscriber;
use serde_json::json;
use wiremock::MockServer;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Init a static subscriber using the `once_cell` crate.
///
/// To opt in to verbose logging, use the env var `TEST_LOG`:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // the two sinks are different types, hence the duplicated arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).unwrap();
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).unwrap();
        }
    };
});

pub struct TestApp {
    pub addr: String,
    pub port: u16,
    /// Stands in for all three providers; each adapter is pointed at it
    pub email_server: MockServer,
    pub api_client: reqwest::Client,
}

/// Confirmation link found in an email body, with the port fixed up to point
/// at the test server.
pub struct ConfirmationLinks {
    pub html: reqwest::Url,
}

impl TestApp {
    /// `POST /subscriptions` with an already url-encoded form body
    pub async fn post_subscriptions(
        &self,
        body: String,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscriptions", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_email_settings(&self) -> reqwest::Response {
        self.api_client
            .get(format!("{}/admin/email_settings", self.addr))
            .bearer_auth(ADMIN_TOKEN)
            .send()
            .await
            .expect("execute request")
    }

    pub async fn put_email_settings(
        &self,
        settings: &serde_json::Value,
    ) -> reqwest::Response {
        self.api_client
            .put(format!("{}/admin/email_settings", self.addr))
            .bearer_auth(ADMIN_TOKEN)
            .json(settings)
            .send()
            .await
            .expect("execute request")
    }

    /// Select Dashamail with a list, so both sending and list membership work.
    pub async fn configure_dashamail(&self) {
        let resp = self
            .put_email_settings(&json!({
                "provider": "dashamail",
                "is_active": true,
                "api_key": "dasha-key",
                "list_id": "7",
                "sender_email": "noreply@securelex.ru",
                "sender_name": "SecureLex.ru",
            }))
            .await;
        assert_eq!(resp.status().as_u16(), 200);
    }

    /// Extract the confirmation link from a `transactional.send` request made to
    /// the mock Dashamail server.
    pub fn get_confirmation_links(
        &self,
        email_req: &wiremock::Request,
    ) -> ConfirmationLinks {
        let form: HashMap<String, String> = serde_urlencoded::from_bytes(&email_req.body).unwrap();
        let html = &form["message"];

        let mut links: Vec<_> = linkify::LinkFinder::new()
            .links(html)
            .filter(|l| *l.kind() == linkify::LinkKind::Url)
            .map(|l| l.as_str().to_owned())
            .collect();
        links.sort();
        links.dedup();
        // the default template repeats the same link as plain text
        assert_eq!(links.len(), 1, "{links:?}");

        let mut link = reqwest::Url::parse(&links[0]).unwrap();
        // never send requests to anything other than localhost
        assert_eq!(link.host_str().unwrap(), "127.0.0.1");
        link.set_port(Some(self.port)).unwrap();

        ConfirmationLinks { html: link }
    }
}

/// Spawn the application on a random port, with every provider base url
/// pointing at a fresh `MockServer`. The email service starts unconfigured.
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().unwrap();
        // port 0: the OS picks a free port, read back via `get_port`
        cfg.application.port = 0;
        cfg.application.base_url = "http://127.0.0.1".to_string();
        cfg.application.admin_token = Secret::new(ADMIN_TOKEN.to_string());
        cfg.email_client.sendpulse_base_url = email_server.uri();
        cfg.email_client.unisender_base_url = email_server.uri();
        cfg.email_client.dashamail_base_url = email_server.uri();
        cfg.email_service = None;
        cfg
    };

    let app = Application::build(cfg).await.unwrap();
    let port = app.get_port();
    let addr = format!("http://127.0.0.1:{port}");
    tokio::spawn(app.run_until_stopped());

    TestApp {
        addr,
        port,
        email_server,
        api_client: reqwest::Client::new(),
    }
}
