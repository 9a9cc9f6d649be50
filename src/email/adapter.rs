//! The capability every email vendor adapter provides, and the result values
//! callers get back from it.

use async_trait::async_trait;
use serde::Serialize;

/// A single transactional email, already rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub from_email: String,
    pub from_name: String,
}

/// A mailing list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSubscriber {
    pub email: String,
    pub name: Option<String>,
}

/// Outcome of `send_email`. Expected failures (configuration, vendor,
/// transport) are reported here rather than as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl From<Result<(), ProviderError>> for SendResult {
    fn from(value: Result<(), ProviderError>) -> Self {
        match value {
            Ok(()) => Self::ok(),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Outcome of `add_to_list`. `external_id` is the vendor's id for the
/// subscriber record, when the vendor returns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddToListResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddToListResult {
    pub fn ok(external_id: Option<String>) -> Self {
        Self {
            success: true,
            external_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            external_id: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<Option<String>, ProviderError>> for AddToListResult {
    fn from(value: Result<Option<String>, ProviderError>) -> Self {
        match value {
            Ok(id) => Self::ok(id),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// Failure inside an adapter. Never leaves the adapter: the trait methods
/// flatten it into `SendResult`/`AddToListResult`.
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    /// DNS, connect, TLS, timeout, body read
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    /// Raw error text (or code) as reported by the vendor
    #[error("{0}")]
    Vendor(String),
    #[error("Unexpected response from provider: {0}")]
    MalformedResponse(String),
}

/// Per-vendor implementation of the send/subscribe capability.
///
/// Implementations issue exactly one vendor request per call (SendPulse may
/// fetch an access token first), never retry, and never return `Err` or
/// panic for HTTP-level failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn send_email(
        &self,
        message: &EmailMessage,
    ) -> SendResult;

    /// Add or update `subscriber` in the vendor list `list_id`.
    async fn add_to_list(
        &self,
        list_id: &str,
        subscriber: &ListSubscriber,
    ) -> AddToListResult;

    /// For logs only
    fn provider_name(&self) -> &'static str;
}

/// Read a non-2xx response into a `ProviderError::Vendor` carrying the raw
/// body (or the status line when the body is empty).
pub(crate) async fn vendor_error(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.trim().is_empty() => ProviderError::Vendor(body),
        Ok(_) => ProviderError::Vendor(status.to_string()),
        Err(e) => ProviderError::Transport(e),
    }
}
