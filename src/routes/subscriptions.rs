use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use anyhow::Context;
use serde::Deserialize;

use crate::domain::ConfirmationToken;
use crate::domain::NewSubscriber;
use crate::domain::SubscriberEmail;
use crate::domain::SubscriberName;
use crate::email::EmailSubscriptionService;
use crate::startup::AppBaseUrl;
use crate::startup::HmacSecret;
use crate::utils::error_chain_fmt;

#[derive(Deserialize)]
pub struct FormData {
    email: String,
    name: String,
}

impl TryFrom<FormData> for NewSubscriber {
    type Error = String;
    fn try_from(value: FormData) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(value.email)?;
        let name = SubscriberName::parse(value.name)?;
        Ok(Self { email, name })
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Email service is not configured")]
    NotConfigured,
    #[error("Provider did not accept the confirmation email: {0}")]
    SendError(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl Debug for SubscribeError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::SendError(_) | Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Link the subscriber follows to confirm. Carries a signed token, so no
/// pending-subscription record is needed.
pub fn confirmation_link(
    base_url: &str,
    token: &ConfirmationToken,
) -> String {
    format!(
        "{}/subscriptions/confirm?subscription_token={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(token.as_str())
    )
}

/// `POST /subscriptions`
///
/// Parses the form, then asks the active provider to send the confirmation
/// email. Nothing is added to the mailing list until the link is followed
/// (see `confirm`).
///
/// ```sh
///     curl --data 'email=ivan%40test.ru&name=Ivan' http://127.0.0.1:8000/subscriptions
/// ```
#[tracing::instrument(
    name = "Adding new subscriber",
    skip(form, email_service, base_url, hmac_secret),
    fields(
        subscriber_email = %form.email,
        subscriber_name = %form.name,
    )
)]
pub async fn subscribe(
    form: web::Form<FormData>,
    email_service: web::Data<EmailSubscriptionService>,
    base_url: web::Data<AppBaseUrl>,
    hmac_secret: web::Data<HmacSecret>,
) -> Result<HttpResponse, SubscribeError> {
    let new_sub: NewSubscriber = form
        .0
        .try_into()
        .map_err(SubscribeError::ValidationError)?;

    if !email_service.is_configured() {
        return Err(SubscribeError::NotConfigured);
    }

    let token = ConfirmationToken::issue(&new_sub, &hmac_secret.0)
        .context("Failed to issue confirmation token")?;
    let link = confirmation_link(&base_url.0, &token);

    let result = email_service
        .send_confirmation_email(new_sub.email.as_ref(), &link)
        .await;
    match result.success {
        true => Ok(HttpResponse::Ok().finish()),
        false => Err(SubscribeError::SendError(
            result.error.unwrap_or_else(|| "unknown error".to_string()),
        )),
    }
}
