use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::vendor_error;
use super::AddToListResult;
use super::EmailMessage;
use super::ListSubscriber;
use super::ProviderAdapter;
use super::ProviderError;
use super::SendResult;
use super::UnisenderConfig;

/// Every Unisender response carries either `result` or `error` (+ `code`).
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    error: Option<String>,
    code: Option<String>,
}

impl Envelope {
    fn into_result(self) -> Result<Value, ProviderError> {
        match (self.error, self.code) {
            (Some(error), _) if !error.is_empty() => Err(ProviderError::Vendor(error)),
            (_, Some(code)) if !code.is_empty() => Err(ProviderError::Vendor(code)),
            _ => Ok(self.result),
        }
    }
}

/// Unisender adapter. Form-encoded requests authenticated with the API key.
pub struct UnisenderAdapter {
    http_client: Client,
    base_url: String,
    config: UnisenderConfig,
}

impl UnisenderAdapter {
    pub fn new(
        http_client: Client,
        base_url: String,
        config: UnisenderConfig,
    ) -> Self {
        Self {
            http_client,
            base_url,
            config,
        }
    }

    async fn call(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        // Unisender reads api_key from either the query string or the body;
        // the body keeps it out of proxy/access logs that record urls
        let mut form = vec![("api_key", self.config.api_key.expose_secret().as_str())];
        form.extend_from_slice(params);

        let response = self
            .http_client
            .post(format!("{}/{method}", self.base_url))
            .query(&[("format", "json")])
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(vendor_error(response).await);
        }
        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        envelope.into_result()
    }

    async fn try_send(
        &self,
        message: &EmailMessage,
    ) -> Result<(), ProviderError> {
        let mut params = vec![
            ("email", message.to.as_str()),
            ("sender_name", message.from_name.as_str()),
            ("sender_email", message.from_email.as_str()),
            ("subject", message.subject.as_str()),
            ("body", message.html.as_str()),
        ];
        if let Some(list_id) = &self.config.list_id {
            params.push(("list_id", list_id.as_str()));
        }
        let result = self.call("sendEmail", &params).await?;

        // per-recipient failures come back inside a successful envelope
        let recipient_error = result
            .as_array()
            .and_then(|r| r.first())
            .and_then(|r| r.get("errors"))
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
            .map(|e| {
                e.get("message")
                    .or_else(|| e.get("code"))
                    .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                    .unwrap_or_else(|| e.to_string())
            });
        match recipient_error {
            Some(error) => Err(ProviderError::Vendor(error)),
            None => Ok(()),
        }
    }

    async fn try_add_to_list(
        &self,
        list_id: &str,
        subscriber: &ListSubscriber,
    ) -> Result<Option<String>, ProviderError> {
        let mut params = vec![
            ("list_ids", list_id),
            ("fields[email]", subscriber.email.as_str()),
            ("double_optin", "0"),
        ];
        if let Some(name) = &subscriber.name {
            params.push(("fields[Name]", name.as_str()));
        }
        let result = self.call("subscribe", &params).await?;
        Ok(result.get("person_id").and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }))
    }
}

#[async_trait]
impl ProviderAdapter for UnisenderAdapter {
    async fn send_email(
        &self,
        message: &EmailMessage,
    ) -> SendResult {
        let result = self.try_send(message).await;
        if let Err(e) = &result {
            tracing::error!(to = %message.to, error = %e, "Unisender rejected email");
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
            tracing::error!(list_id, error = %e, "Unisender rejected subscriber");
        }
        result.into()
    }

    fn provider_name(&self) -> &'static str { "unisender" }
}
