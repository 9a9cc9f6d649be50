use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde::Serialize;

use crate::email::templates;
use crate::email::ConfigurationState;
use crate::email::EmailServiceSettings;
use crate::email::EmailSubscriptionService;
use crate::startup::AppBaseUrl;

/// Body of every `/admin/email_settings` response.
///
/// ```json
/// {"state": "active", "provider": "dashamail", "configured": true}
/// ```
#[derive(Serialize)]
pub struct EmailServiceStatus {
    #[serde(flatten)]
    state: ConfigurationState,
    configured: bool,
}

impl From<&EmailSubscriptionService> for EmailServiceStatus {
    fn from(service: &EmailSubscriptionService) -> Self {
        Self {
            state: service.state(),
            configured: service.is_configured(),
        }
    }
}

/// `GET /admin/email_settings`
pub async fn email_settings_status(
    email_service: web::Data<EmailSubscriptionService>
) -> HttpResponse {
    HttpResponse::Ok().json(EmailServiceStatus::from(email_service.get_ref()))
}

/// `PUT /admin/email_settings`
///
/// Replaces the provider settings wholesale. Settings that select no usable
/// provider are accepted and leave the service disabled; check `configured`
/// in the response.
///
/// ```sh
///     curl -X PUT -H "Authorization: Bearer $TOKEN" -H 'Content-Type: application/json' \
///         -d '{"provider": "dashamail", "is_active": true, "api_key": "..."}' \
///         http://127.0.0.1:8000/admin/email_settings
/// ```
#[tracing::instrument(
    name = "Updating email settings",
    skip(settings, email_service),
    fields(provider = %settings.provider, is_active = settings.is_active)
)]
pub async fn update_email_settings(
    settings: web::Json<EmailServiceSettings>,
    email_service: web::Data<EmailSubscriptionService>,
) -> HttpResponse {
    email_service.configure(settings.into_inner());
    HttpResponse::Ok().json(EmailServiceStatus::from(email_service.get_ref()))
}

#[derive(Deserialize)]
pub struct PreviewParameters {
    confirm_url: Option<String>,
}

/// `GET /admin/email_settings/templates/confirmation[?confirm_url=...]`
///
/// Built-in confirmation email, rendered with `confirm_url` or a sample link.
pub async fn preview_confirmation_template(
    params: web::Query<PreviewParameters>,
    base_url: web::Data<AppBaseUrl>,
) -> HttpResponse {
    let confirm_url = params.0.confirm_url.unwrap_or_else(|| {
        format!(
            "{}/subscriptions/confirm?subscription_token=example",
            base_url.0.trim_end_matches('/')
        )
    });
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(templates::default_confirmation_template(&confirm_url))
}

/// `GET /admin/email_settings/templates/welcome`
pub async fn preview_welcome_template() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(templates::default_welcome_template())
}
