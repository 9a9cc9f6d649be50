use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::web::Data;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use anyhow::Context;
use secrecy::Secret;
use tracing_actix_web::TracingLogger;

use crate::authentication::reject_non_admins;
use crate::authentication::AdminToken;
use crate::configuration::Settings;
use crate::email::EmailSubscriptionService;
use crate::routes::confirm;
use crate::routes::email_settings_status;
use crate::routes::health_check;
use crate::routes::preview_confirmation_template;
use crate::routes::preview_welcome_template;
use crate::routes::subscribe;
use crate::routes::update_email_settings;

/// Wrapper for actix's `Server` with access to the bound port. Not to be
/// confused with actix's `App`!
pub struct Application {
    /// Left private; use `get_port` to access
    port: u16,
    server: Server,
}

impl Application {
    /// Bind the listener, build the email service (applying
    /// `Settings.email_service` if present) and hand both to `run`.
    pub async fn build(cfg: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("{}:{}", cfg.application.host, cfg.application.port);
        let listener = TcpListener::bind(&addr).with_context(|| format!("Failed to bind {addr}"))?;

        // port 0 in tests; the OS picks one
        let port = listener.local_addr()?.port();

        let http_client = cfg
            .email_client
            .http_client()
            .context("Failed to build HTTP client for email providers")?;
        let email_service = EmailSubscriptionService::new(http_client, cfg.email_client.endpoints());
        match cfg.email_service {
            Some(settings) => {
                email_service.configure(settings);
            }
            None => tracing::info!("No email settings in configuration; waiting for an admin"),
        }

        let server = run(
            listener,
            email_service,
            cfg.application.base_url,
            cfg.application.hmac_secret,
            cfg.application.admin_token,
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Because this consumes `self`, this should be the final function call (or
    /// passed to `tokio::spawn`)
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Wrapper for top-level application `base_url` (because raw `String`s may
/// conflict with one another when passed around by `Data`)
pub struct AppBaseUrl(pub String);

/// Key for signing confirmation tokens.
#[derive(Clone)]
pub struct HmacSecret(pub Secret<String>);

/// The server is not responsible for binding to an address, it only listens to
/// an already bound address.
///
/// Declares all API endpoints.
pub fn run(
    listener: TcpListener,
    email_service: EmailSubscriptionService,
    base_url: String,
    hmac_secret: Secret<String>,
    admin_token: Secret<String>,
) -> Result<Server, anyhow::Error> {
    // one service shared by every worker, so a `configure` through the admin
    // route is seen by all of them
    let email_service = web::Data::new(email_service);
    let base_url = Data::new(AppBaseUrl(base_url));
    let hmac_secret = Data::new(HmacSecret(hmac_secret));
    let admin_token = Data::new(AdminToken(admin_token));

    let server = HttpServer::new(move || {
        App::new()
            // every request gets a span with a request id; handler spans (e.g.
            // "Adding new subscriber") nest under it, so `| bunyan` output can be
            // grepped per request
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/subscriptions", web::post().to(subscribe))
            .route("/subscriptions/confirm", web::get().to(confirm))
            .service(
                web::scope("/admin")
                    .wrap(from_fn(reject_non_admins))
                    .route("/email_settings", web::get().to(email_settings_status))
                    .route("/email_settings", web::put().to(update_email_settings))
                    .route(
                        "/email_settings/templates/confirmation",
                        web::get().to(preview_confirmation_template),
                    )
                    .route(
                        "/email_settings/templates/welcome",
                        web::get().to(preview_welcome_template),
                    ),
            )
            .app_data(email_service.clone())
            .app_data(base_url.clone())
            .app_data(hmac_secret.clone())
            .app_data(admin_token.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
