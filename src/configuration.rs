use std::env;
use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use config::Config;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::email::EmailServiceSettings;
use crate::email::ProviderEndpoints;

/// Global configuration, loaded from `configuration/*.yaml` and `APP_*` env
/// vars. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    /// Provider settings applied at startup. Absent means the email service
    /// starts unconfigured and waits for `PUT /admin/email_settings`.
    pub email_service: Option<EmailServiceSettings>,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// localhost on a dev machine, 0.0.0.0 in production
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Public root used to build confirmation links
    pub base_url: String,
    /// Signs confirmation tokens
    pub hmac_secret: Secret<String>,
    /// Bearer token required by `/admin` routes
    pub admin_token: Secret<String>,
}

/// Transport settings shared by every provider adapter
#[derive(Deserialize, Clone)]
pub struct EmailClientSettings {
    /// Vendor calls have no timeout of their own; this one is applied to the
    /// shared `reqwest::Client`
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    pub sendpulse_base_url: String,
    pub unisender_base_url: String,
    pub dashamail_base_url: String,
}

impl EmailClientSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn endpoints(&self) -> ProviderEndpoints {
        ProviderEndpoints {
            sendpulse: self.sendpulse_base_url.trim_end_matches('/').to_string(),
            unisender: self.unisender_base_url.trim_end_matches('/').to_string(),
            dashamail: self.dashamail_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder().timeout(self.timeout()).build()
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("{e} is not a supported environment; use `local` or `production`")),
        }
    }
}

/// Load `<project_root>/configuration/base.yaml`, then the file for
/// `APP_ENVIRONMENT` (default `local`), then `APP_`-prefixed env vars:
///
/// `APP_APPLICATION__PORT=5001` -> `Settings.application.port`
/// `APP_EMAIL_SERVICE__PROVIDER=dashamail` -> `Settings.email_service.provider`
pub fn get_configuration() -> Result<Settings, anyhow::Error> {
    let cfg_dir = env::current_dir()
        .context("could not get current dir")?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".to_string())
        .try_into()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}
