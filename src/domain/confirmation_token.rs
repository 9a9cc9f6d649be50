use anyhow::Context;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::Hmac;
use hmac::Mac;
use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use super::NewSubscriber;
use super::SubscriberEmail;
use super::SubscriberName;

type HmacSha256 = Hmac<Sha256>;

#[derive(Serialize, Deserialize)]
struct Claims {
    email: String,
    name: String,
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("Malformed confirmation token")]
    Malformed,
    #[error("Confirmation token signature does not match")]
    BadSignature,
    #[error("Confirmation token carries an invalid subscriber: {0}")]
    InvalidSubscriber(String),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

/// Stateless subscription confirmation token.
///
/// The token is `<payload>.<tag>`, where `payload` is the base64url-encoded
/// JSON `{email, name}` and `tag` is the hex HMAC-SHA256 of `payload` under the
/// application secret. Nothing is stored server-side; a subscriber is
/// confirmed by presenting a token we signed.
#[derive(Debug, Clone)]
pub struct ConfirmationToken(String);

fn mac(secret: &Secret<String>) -> Result<HmacSha256, anyhow::Error> {
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .context("Failed to init HMAC with application secret")
}

impl ConfirmationToken {
    pub fn issue(
        subscriber: &NewSubscriber,
        secret: &Secret<String>,
    ) -> Result<Self, anyhow::Error> {
        let claims = Claims {
            email: subscriber.email.as_ref().to_string(),
            name: subscriber.name.as_ref().to_string(),
        };
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).context("Failed to encode claims")?);

        let mut mac = mac(secret)?;
        mac.update(payload.as_bytes());
        let tag = hex::encode(mac.finalize().into_bytes());

        Ok(Self(format!("{payload}.{tag}")))
    }

    /// Check the tag, then re-parse the embedded subscriber (the secret may
    /// have signed data produced under looser parsing rules).
    pub fn verify(
        token: &str,
        secret: &Secret<String>,
    ) -> Result<NewSubscriber, TokenError> {
        let (payload, tag) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let tag = hex::decode(tag).map_err(|_| TokenError::Malformed)?;

        let mut mac = mac(secret)?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| TokenError::BadSignature)?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

        Ok(NewSubscriber {
            email: SubscriberEmail::parse(claims.email).map_err(TokenError::InvalidSubscriber)?,
            name: SubscriberName::parse(claims.name).map_err(TokenError::InvalidSubscriber)?,
        })
    }

    pub fn as_str(&self) -> &str { &self.0 }
}
