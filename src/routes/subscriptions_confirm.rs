use std::fmt::Debug;

use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Deserialize;

use crate::domain::ConfirmationToken;
use crate::domain::TokenError;
use crate::email::EmailSubscriptionService;
use crate::startup::HmacSecret;
use crate::utils::error_chain_fmt;

#[derive(Deserialize)]
pub struct Parameters {
    subscription_token: String,
}

#[derive(thiserror::Error)]
pub enum ConfirmError {
    #[error(transparent)]
    InvalidToken(#[from] TokenError),
    #[error("Email service is not configured")]
    NotConfigured,
    #[error("Provider did not add the subscriber to the list: {0}")]
    ListError(String),
}

impl Debug for ConfirmError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ConfirmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken(TokenError::UnexpectedError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            Self::ListError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `GET /subscriptions/confirm?subscription_token=...`
///
/// The link sent by `subscribe`. A valid token adds the subscriber to the
/// configured list, after which the welcome email is sent. The welcome email
/// is best-effort: the subscriber is already on the list, so its failure is
/// only logged.
#[tracing::instrument(name = "Confirming subscriber", skip(params, email_service, hmac_secret))]
pub async fn confirm(
    params: web::Query<Parameters>,
    email_service: web::Data<EmailSubscriptionService>,
    hmac_secret: web::Data<HmacSecret>,
) -> Result<HttpResponse, ConfirmError> {
    let sub = ConfirmationToken::verify(&params.subscription_token, &hmac_secret.0)?;

    if !email_service.is_configured() {
        return Err(ConfirmError::NotConfigured);
    }

    let added = email_service
        .add_subscriber_to_list(sub.email.as_ref(), Some(sub.name.as_ref()))
        .await;
    if !added.success {
        return Err(ConfirmError::ListError(
            added.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    tracing::info!(
        subscriber_email = %sub.email,
        external_id = ?added.external_id,
        "Subscriber added to mailing list"
    );

    let welcome = email_service.send_welcome_email(sub.email.as_ref()).await;
    if let Some(e) = welcome.error {
        tracing::warn!(subscriber_email = %sub.email, error = %e, "Welcome email was not sent");
    }

    Ok(HttpResponse::Ok().finish())
}
