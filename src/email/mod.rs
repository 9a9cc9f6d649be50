//! Multi-provider email dispatch.
//!
//! `EmailSubscriptionService` holds the current `EmailServiceSettings` and the
//! adapter they select; each adapter turns the generic send/subscribe calls
//! into one vendor's HTTP API:
//! - SendPulse (OAuth2 client credentials, JSON)
//! - Unisender (API key, form-encoded)
//! - Dashamail (API key, form-encoded, single endpoint)

mod adapter;
mod dashamail;
mod sendpulse;
mod service;
mod settings;
pub mod templates;
mod unisender;

#[cfg(test)]
pub use adapter::MockProviderAdapter;
pub use adapter::AddToListResult;
pub use adapter::EmailMessage;
pub use adapter::ListSubscriber;
pub use adapter::ProviderAdapter;
pub use adapter::ProviderError;
pub use adapter::SendResult;
pub use dashamail::DashamailAdapter;
pub use sendpulse::SendPulseAdapter;
pub use service::ConfigurationState;
pub use service::EmailSubscriptionService;
pub use service::HttpProviderFactory;
pub use service::ProviderEndpoints;
pub use service::ProviderFactory;
pub use service::LIST_NOT_CONFIGURED;
pub use service::NOT_CONFIGURED;
pub use settings::DashamailConfig;
pub use settings::EmailProviderKind;
pub use settings::EmailServiceSettings;
pub use settings::ProviderConfig;
pub use settings::SendPulseConfig;
pub use settings::UnisenderConfig;
pub use settings::Unselected;
pub use unisender::UnisenderAdapter;
