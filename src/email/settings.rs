use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;
use serde::Serialize;

/// Which vendor the settings point at. `None` disables sending altogether.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailProviderKind {
    #[default]
    None,
    SendPulse,
    Unisender,
    Dashamail,
}

impl std::fmt::Display for EmailProviderKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::None => "none",
                Self::SendPulse => "sendpulse",
                Self::Unisender => "unisender",
                Self::Dashamail => "dashamail",
            }
        )
    }
}

/// Email provider settings, owned by whoever persists them (admin UI,
/// configuration files) and pushed into the service with `configure`.
///
/// Every field has a default so partial sources (e.g. a handful of env vars)
/// still deserialize; missing credentials are dealt with at selection time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmailServiceSettings {
    pub provider: EmailProviderKind,
    pub is_active: bool,
    /// SendPulse client id, Unisender/Dashamail API key
    pub api_key: Option<Secret<String>>,
    /// SendPulse client secret
    pub api_secret: Option<Secret<String>>,
    pub list_id: Option<String>,
    pub sender_email: String,
    pub sender_name: String,
    pub confirmation_template: Option<String>,
    pub confirmation_subject: Option<String>,
    pub welcome_template: Option<String>,
    pub welcome_subject: Option<String>,
}

/// `Some` only when the value holds more than whitespace.
fn present(value: &Option<Secret<String>>) -> Option<Secret<String>> {
    value
        .as_ref()
        .filter(|s| !s.expose_secret().trim().is_empty())
        .cloned()
}

impl EmailServiceSettings {
    /// The configured list id, ignoring blanks.
    pub fn list_id(&self) -> Option<&str> {
        self.list_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct SendPulseConfig {
    pub client_id: Secret<String>,
    pub client_secret: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct UnisenderConfig {
    pub api_key: Secret<String>,
    /// Unisender's `sendEmail` wants a list to attribute the message to
    pub list_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DashamailConfig {
    pub api_key: Secret<String>,
}

/// Credentials for exactly one vendor. Built from `EmailServiceSettings` when
/// the settings are active and complete.
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    SendPulse(SendPulseConfig),
    Unisender(UnisenderConfig),
    Dashamail(DashamailConfig),
}

/// Why `ProviderConfig::from_settings` produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unselected {
    /// `is_active` is false or the provider is `none`
    Disabled,
    /// Active, but the provider's credentials are incomplete
    MissingCredentials(EmailProviderKind),
}

impl ProviderConfig {
    pub fn from_settings(settings: &EmailServiceSettings) -> Result<Self, Unselected> {
        if !settings.is_active {
            return Err(Unselected::Disabled);
        }
        let missing = Unselected::MissingCredentials(settings.provider);
        match settings.provider {
            EmailProviderKind::None => Err(Unselected::Disabled),
            EmailProviderKind::SendPulse => {
                match (present(&settings.api_key), present(&settings.api_secret)) {
                    (Some(client_id), Some(client_secret)) => {
                        Ok(Self::SendPulse(SendPulseConfig {
                            client_id,
                            client_secret,
                        }))
                    }
                    _ => Err(missing),
                }
            }
            EmailProviderKind::Unisender => {
                let api_key = present(&settings.api_key).ok_or(missing)?;
                Ok(Self::Unisender(UnisenderConfig {
                    api_key,
                    list_id: settings.list_id().map(str::to_string),
                }))
            }
            EmailProviderKind::Dashamail => {
                let api_key = present(&settings.api_key).ok_or(missing)?;
                Ok(Self::Dashamail(DashamailConfig { api_key }))
            }
        }
    }

    pub fn kind(&self) -> EmailProviderKind {
        match self {
            Self::SendPulse(_) => EmailProviderKind::SendPulse,
            Self::Unisender(_) => EmailProviderKind::Unisender,
            Self::Dashamail(_) => EmailProviderKind::Dashamail,
        }
    }
}
