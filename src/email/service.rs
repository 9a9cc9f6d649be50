use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

use reqwest::Client;
use serde::Serialize;

use super::templates;
use super::AddToListResult;
use super::DashamailAdapter;
use super::EmailMessage;
use super::EmailProviderKind;
use super::EmailServiceSettings;
use super::ListSubscriber;
use super::ProviderAdapter;
use super::ProviderConfig;
use super::SendPulseAdapter;
use super::SendResult;
use super::UnisenderAdapter;
use super::Unselected;

pub const NOT_CONFIGURED: &str = "Email service not configured";
pub const LIST_NOT_CONFIGURED: &str = "Mailing list ID not configured";

/// Vendor API roots. Production values are the defaults; tests point them at
/// a mock server.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub sendpulse: String,
    pub unisender: String,
    pub dashamail: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            sendpulse: "https://api.sendpulse.com".to_string(),
            unisender: "https://api.unisender.com/ru/api".to_string(),
            dashamail: "https://api.dashamail.com".to_string(),
        }
    }
}

/// Builds the adapter for a selected provider. The HTTP implementation is
/// `HttpProviderFactory`; any `Fn(ProviderConfig) -> Arc<dyn ProviderAdapter>`
/// works too, which is how the service is tested without a network.
pub trait ProviderFactory: Send + Sync {
    fn create(
        &self,
        config: ProviderConfig,
    ) -> Arc<dyn ProviderAdapter>;
}

impl<F> ProviderFactory for F
where
    F: Fn(ProviderConfig) -> Arc<dyn ProviderAdapter> + Send + Sync,
{
    fn create(
        &self,
        config: ProviderConfig,
    ) -> Arc<dyn ProviderAdapter> {
        self(config)
    }
}

/// Adapters talking to the real vendor APIs over one shared `Client`.
pub struct HttpProviderFactory {
    http_client: Client,
    endpoints: ProviderEndpoints,
}

impl HttpProviderFactory {
    pub fn new(
        http_client: Client,
        endpoints: ProviderEndpoints,
    ) -> Self {
        Self {
            http_client,
            endpoints,
        }
    }
}

impl ProviderFactory for HttpProviderFactory {
    fn create(
        &self,
        config: ProviderConfig,
    ) -> Arc<dyn ProviderAdapter> {
        // `Client` is an `Arc` internally; cloning shares the connection pool
        let client = self.http_client.clone();
        match config {
            ProviderConfig::SendPulse(cfg) => Arc::new(SendPulseAdapter::new(
                client,
                self.endpoints.sendpulse.clone(),
                cfg,
            )),
            ProviderConfig::Unisender(cfg) => Arc::new(UnisenderAdapter::new(
                client,
                self.endpoints.unisender.clone(),
                cfg,
            )),
            ProviderConfig::Dashamail(cfg) => Arc::new(DashamailAdapter::new(
                client,
                self.endpoints.dashamail.clone(),
                cfg,
            )),
        }
    }
}

/// Where the service stands after the last `configure` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "provider", rename_all = "lowercase")]
pub enum ConfigurationState {
    /// `configure` was never called
    Unconfigured,
    /// Inactive, provider `none`, or credentials missing
    Disabled,
    Active(EmailProviderKind),
}

#[derive(Clone, Default)]
struct Current {
    settings: Option<Arc<EmailServiceSettings>>,
    adapter: Option<Arc<dyn ProviderAdapter>>,
}

/// Sends confirmation/welcome emails and manages list membership through
/// whichever provider the current settings select.
///
/// One instance is built at startup and shared by all request handlers;
/// `configure` swaps the provider for every call issued after it returns.
pub struct EmailSubscriptionService {
    factory: Box<dyn ProviderFactory>,
    // never held across an `.await`; calls clone the `Arc`s out and release it.
    // since nothing awaits under the lock, std's RwLock is enough and tokio's
    // async one would only add overhead
    current: RwLock<Current>,
}

impl EmailSubscriptionService {
    pub fn new(
        http_client: Client,
        endpoints: ProviderEndpoints,
    ) -> Self {
        Self::with_factory(HttpProviderFactory::new(http_client, endpoints))
    }

    pub fn with_factory(factory: impl ProviderFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            current: RwLock::new(Current::default()),
        }
    }

    fn current(&self) -> Current {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Settings and adapter, but only when sending is allowed.
    fn active(&self) -> Option<(Arc<EmailServiceSettings>, Arc<dyn ProviderAdapter>)> {
        match self.current() {
            Current {
                settings: Some(settings),
                adapter: Some(adapter),
            } if settings.is_active => Some((settings, adapter)),
            _ => None,
        }
    }

    /// Replace the settings and rebuild the adapter from them.
    ///
    /// Never fails: settings that are inactive, point at `none` or lack the
    /// provider's credentials leave the service without an adapter, and every
    /// send reports "not configured" until the next `configure`.
    pub fn configure(
        &self,
        settings: EmailServiceSettings,
    ) -> ConfigurationState {
        let adapter = match ProviderConfig::from_settings(&settings) {
            Ok(config) => {
                let adapter = self.factory.create(config);
                tracing::info!(provider = adapter.provider_name(), "Email provider configured");
                Some(adapter)
            }
            Err(Unselected::Disabled) => {
                tracing::info!("Email provider disabled");
                None
            }
            Err(Unselected::MissingCredentials(provider)) => {
                tracing::warn!(
                    %provider,
                    "Email provider is active but its credentials are incomplete; sending is disabled"
                );
                None
            }
        };

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Current {
            settings: Some(Arc::new(settings)),
            adapter,
        };
        self.state()
    }

    pub fn is_configured(&self) -> bool { self.active().is_some() }

    pub fn state(&self) -> ConfigurationState {
        match self.current() {
            Current { settings: None, .. } => ConfigurationState::Unconfigured,
            Current {
                settings: Some(settings),
                adapter: Some(_),
            } if settings.is_active => ConfigurationState::Active(settings.provider),
            Current { .. } => ConfigurationState::Disabled,
        }
    }

    /// Send the double opt-in email. A custom template has every
    /// `{{confirmUrl}}` replaced; otherwise the built-in template is used.
    #[tracing::instrument(name = "Sending confirmation email", skip(self, confirm_url))]
    pub async fn send_confirmation_email(
        &self,
        email: &str,
        confirm_url: &str,
    ) -> SendResult {
        let Some((settings, adapter)) = self.active() else {
            return SendResult::failed(NOT_CONFIGURED);
        };
        let html = match non_blank(&settings.confirmation_template) {
            Some(template) => templates::render_confirmation(template, confirm_url),
            None => templates::default_confirmation_template(confirm_url),
        };
        let subject = non_blank(&settings.confirmation_subject)
            .unwrap_or(templates::DEFAULT_CONFIRMATION_SUBJECT);

        adapter
            .send_email(&message(&settings, email, subject, html))
            .await
    }

    #[tracing::instrument(name = "Sending welcome email", skip(self))]
    pub async fn send_welcome_email(
        &self,
        email: &str,
    ) -> SendResult {
        let Some((settings, adapter)) = self.active() else {
            return SendResult::failed(NOT_CONFIGURED);
        };
        let html = match non_blank(&settings.welcome_template) {
            Some(template) => template.to_string(),
            None => templates::default_welcome_template(),
        };
        let subject =
            non_blank(&settings.welcome_subject).unwrap_or(templates::DEFAULT_WELCOME_SUBJECT);

        adapter
            .send_email(&message(&settings, email, subject, html))
            .await
    }

    #[tracing::instrument(name = "Adding subscriber to mailing list", skip(self))]
    pub async fn add_subscriber_to_list(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> AddToListResult {
        let Some((settings, adapter)) = self.active() else {
            return AddToListResult::failed(NOT_CONFIGURED);
        };
        let Some(list_id) = settings.list_id() else {
            return AddToListResult::failed(LIST_NOT_CONFIGURED);
        };

        adapter
            .add_to_list(
                list_id,
                &ListSubscriber {
                    email: email.to_string(),
                    name: name.map(str::to_string),
                },
            )
            .await
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn message(
    settings: &EmailServiceSettings,
    to: &str,
    subject: &str,
    html: String,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: subject.to_string(),
        html,
        from_email: settings.sender_email.clone(),
        from_name: settings.sender_name.clone(),
    }
}
