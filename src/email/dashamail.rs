use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::Value;

use super::adapter::vendor_error;
use super::AddToListResult;
use super::DashamailConfig;
use super::EmailMessage;
use super::ListSubscriber;
use super::ProviderAdapter;
use super::ProviderError;
use super::SendResult;

#[derive(Deserialize)]
struct Envelope {
    response: Body,
}

#[derive(Deserialize)]
struct Body {
    msg: Msg,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct Msg {
    err_code: i64,
    #[serde(default)]
    text: String,
}

/// Dashamail adapter. Everything is a form POST to the API root; `method`
/// picks the operation and `response.msg.err_code == 0` means success.
pub struct DashamailAdapter {
    http_client: Client,
    base_url: String,
    config: DashamailConfig,
}

impl DashamailAdapter {
    pub fn new(
        http_client: Client,
        base_url: String,
        config: DashamailConfig,
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
        let mut form = vec![
            ("method", method),
            ("api_key", self.config.api_key.expose_secret().as_str()),
        ];
        form.extend_from_slice(params);

        let response = self
            .http_client
            .post(format!("{}/", self.base_url))
            .form(&form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(vendor_error(response).await);
        }
        let Envelope { response } = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        match response.msg.err_code {
            0 => Ok(response.data),
            code if response.msg.text.is_empty() => Err(ProviderError::Vendor(code.to_string())),
            _ => Err(ProviderError::Vendor(response.msg.text)),
        }
    }
}

#[async_trait]
impl ProviderAdapter for DashamailAdapter {
    async fn send_email(
        &self,
        message: &EmailMessage,
    ) -> SendResult {
        let result = self
            .call(
                "transactional.send",
                &[
                    ("to", message.to.as_str()),
                    ("subject", message.subject.as_str()),
                    ("message", message.html.as_str()),
                    ("from_email", message.from_email.as_str()),
                    ("from_name", message.from_name.as_str()),
                ],
            )
            .await
            .map(|_| ());
        if let Err(e) = &result {
            tracing::error!(to = %message.to, error = %e, "Dashamail rejected email");
        }
        result.into()
    }

    async fn add_to_list(
        &self,
        list_id: &str,
        subscriber: &ListSubscriber,
    ) -> AddToListResult {
        let merge = subscriber
            .name
            .as_ref()
            .map(|name| serde_json::json!({ "Name": name }).to_string());
        let mut params = vec![("list_id", list_id), ("email", subscriber.email.as_str())];
        if let Some(merge) = &merge {
            params.push(("merge", merge.as_str()));
        }
        // upsert: repeated calls for the same address update the member
        params.push(("update", "1"));

        let result = self.call("lists.add_member", &params).await.map(|data| {
            data.get("member_id").and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        });
        if let Err(e) = &result {
            tracing::error!(list_id, error = %e, "Dashamail rejected subscriber");
        }
        result.into()
    }

    fn provider_name(&self) -> &'static str { "dashamail" }
}
