use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

use super::adapter::vendor_error;
use super::AddToListResult;
use super::EmailMessage;
use super::ListSubscriber;
use super::ProviderAdapter;
use super::ProviderError;
use super::SendPulseConfig;
use super::SendResult;

/// Tokens are dropped this long before SendPulse says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// SendPulse hands out hour-long tokens; anything claiming to outlive a day is
/// capped (an unbounded `expires_in` would overflow `Instant + Duration`).
const MAX_TOKEN_LIFETIME: u64 = 24 * 60 * 60;

/// An access token and the instant after which it must not be used.
#[derive(Clone)]
struct CachedToken {
    access_token: Secret<String>,
    expires_at: Instant,
}

impl CachedToken {
    fn new(
        access_token: String,
        expires_in: u64,
        now: Instant,
    ) -> Self {
        // the margin covers clock drift and the time the request takes to reach
        // SendPulse; a token used right at its deadline gets rejected otherwise
        let lifetime = Duration::from_secs(expires_in.min(MAX_TOKEN_LIFETIME))
            .saturating_sub(TOKEN_EXPIRY_MARGIN);
        Self {
            access_token: Secret::new(access_token),
            expires_at: now + lifetime,
        }
    }

    fn is_fresh(
        &self,
        now: Instant,
    ) -> bool {
        now < self.expires_at
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    email: Email<'a>,
}

#[derive(Serialize)]
struct Email<'a> {
    /// base64 of the HTML body
    html: String,
    subject: &'a str,
    from: Address<'a>,
    to: Vec<Address<'a>>,
}

#[derive(Serialize)]
struct Address<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Serialize)]
struct AddEmailsRequest<'a> {
    emails: Vec<AddressBookEntry<'a>>,
}

#[derive(Serialize)]
struct AddressBookEntry<'a> {
    email: &'a str,
    variables: Variables<'a>,
}

#[derive(Serialize)]
struct Variables<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// SendPulse adapter. Authenticates with OAuth2 client credentials and keeps
/// the access token in memory until shortly before it expires.
pub struct SendPulseAdapter {
    http_client: Client,
    base_url: String,
    config: SendPulseConfig,
    // held only while reading or storing, never across a request: two calls
    // racing on an expired token may both refresh, which is harmless
    token: Mutex<Option<CachedToken>>,
}

impl SendPulseAdapter {
    pub fn new(
        http_client: Client,
        base_url: String,
        config: SendPulseConfig,
    ) -> Self {
        Self {
            http_client,
            base_url,
            config,
            token: Mutex::new(None),
        }
    }

    fn cached_token(&self) -> Option<Secret<String>> {
        let guard = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|t| t.is_fresh(Instant::now()))
            .map(|t| t.access_token.clone())
    }

    #[tracing::instrument(name = "Fetching SendPulse access token", skip(self))]
    async fn fetch_token(&self) -> Result<Secret<String>, ProviderError> {
        let response = self
            .http_client
            .post(format!("{}/oauth/access_token", self.base_url))
            .json(&TokenRequest {
                grant_type: "client_credentials",
                client_id: self.config.client_id.expose_secret(),
                client_secret: self.config.client_secret.expose_secret(),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(vendor_error(response).await);
        }
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let token = CachedToken::new(body.access_token, body.expires_in, Instant::now());
        let access_token = token.access_token.clone();
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(access_token)
    }

    async fn access_token(&self) -> Result<Secret<String>, ProviderError> {
        match self.cached_token() {
            Some(token) => Ok(token),
            None => self.fetch_token().await,
        }
    }

    async fn try_send(
        &self,
        message: &EmailMessage,
    ) -> Result<(), ProviderError> {
        let token = self.access_token().await?;
        let request = SendRequest {
            email: Email {
                // SendPulse's SMTP API wants the body base64-encoded, even though
                // subject and addresses go as plain JSON strings
                html: STANDARD.encode(&message.html),
                subject: &message.subject,
                from: Address {
                    name: Some(&message.from_name),
                    email: &message.from_email,
                },
                to: vec![Address {
                    name: None,
                    email: &message.to,
                }],
            },
        };
        let response = self
            .http_client
            .post(format!("{}/smtp/emails", self.base_url))
            .bearer_auth(token.expose_secret())
            .json(&request)
            .send()
            .await?;
        match response.status().is_success() {
            true => Ok(()),
            false => Err(vendor_error(response).await),
        }
    }

    async fn try_add_to_list(
        &self,
        list_id: &str,
        subscriber: &ListSubscriber,
    ) -> Result<Option<String>, ProviderError> {
        let token = self.access_token().await?;
        let request = AddEmailsRequest {
            emails: vec![AddressBookEntry {
                email: &subscriber.email,
                variables: Variables {
                    name: subscriber.name.as_deref(),
                },
            }],
        };
        let response = self
            .http_client
            .post(format!(
                "{}/addressbooks/{}/emails",
                self.base_url,
                urlencoding::encode(list_id)
            ))
            .bearer_auth(token.expose_secret())
            .json(&request)
            .send()
            .await?;
        match response.status().is_success() {
            // SendPulse doesn't hand back a per-subscriber id here
            true => Ok(None),
            false => Err(vendor_error(response).await),
        }
    }
}

#[async_trait]
impl ProviderAdapter for SendPulseAdapter {
    async fn send_email(
        &self,
        message: &EmailMessage,
    ) -> SendResult {
        let result = self.try_send(message).await;
        if let Err(e) = &result {
            tracing::error!(to = %message.to, error = %e, "SendPulse rejected email");
        }
        result.into()
    }

    async fn add_to_list(
        &self,
        list_id: &str,
        subscriber: &ListSubscriber,
    ) -> AddToListResult {
        let result = self.try_add_to_list(list_id, subscriber).await;
        if let Err(e) = &result {
            tracing::error!(list_id, error = %e, "SendPulse rejected subscriber");
        }
        result.into()
    }

    fn provider_name(&self) -> &'static str { "sendpulse" }
}
