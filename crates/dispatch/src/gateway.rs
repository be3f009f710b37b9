//! Messaging gateway client: recipient directory lookups and templated sends.
//!
//! Both calls are plain request/response JSON against the gateway's commands
//! and messages endpoints, authenticated with the account API key and tagged
//! with a fresh correlation id per call. Gateway failures never propagate:
//! a failed lookup collapses to `None` and a failed send to a descriptive
//! string, so the dispatch loop can keep going.

use reqwest::header::AUTHORIZATION;
use serde_json::{Value, json};
use uuid::Uuid;

use courier_common::config::AppConfig;

/// Gateway postmaster address that answers directory lookups.
const DIRECTORY_ADDRESS: &str = "postmaster@wa.gw.msging.net";

/// Country code prefixed onto the store's nationally-formatted numbers.
const COUNTRY_CODE: &str = "+55";

/// Resolves a phone number to the gateway's channel-specific identifier.
/// Resolution is never cached; every dispatch re-resolves.
#[allow(async_fn_in_trait)]
pub trait RecipientDirectory {
    async fn resolve(&self, phone: &str) -> Option<String>;
}

/// Sends one templated message to a resolved identifier. `Ok` carries the
/// raw gateway response body, `Err` a transport/protocol error description.
#[allow(async_fn_in_trait)]
pub trait MessageSender {
    async fn send(&self, identifier: &str, message: &str) -> Result<String, String>;
}

/// HTTP client for the messaging gateway.
pub struct GatewayClient {
    http: reqwest::Client,
    commands_url: String,
    messages_url: String,
    api_key: String,
    template_name: String,
    template_namespace: String,
}

impl GatewayClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            commands_url: config.gateway_commands_url.clone(),
            messages_url: config.gateway_messages_url.clone(),
            api_key: config.gateway_api_key.clone(),
            template_name: config.template_name.clone(),
            template_namespace: config.template_namespace.clone(),
        }
    }

    /// Directory lookup command for a nationally-formatted phone number.
    fn lookup_payload(phone: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "to": DIRECTORY_ADDRESS,
            "method": "get",
            "uri": format!("lime://wa.gw.msging.net/accounts/{}{}", COUNTRY_CODE, phone),
        })
    }

    /// Template message envelope with the free text as the single body
    /// parameter.
    fn template_payload(&self, identifier: &str, message: &str) -> Value {
        json!({
            "id": Uuid::new_v4().to_string(),
            "to": identifier,
            "type": "application/json",
            "content": {
                "type": "template",
                "template": {
                    "namespace": self.template_namespace,
                    "language": { "code": "pt_BR", "policy": "deterministic" },
                    "name": self.template_name,
                    "components": [{
                        "type": "body",
                        "parameters": [{ "type": "text", "text": message }]
                    }]
                }
            }
        })
    }
}

impl RecipientDirectory for GatewayClient {
    async fn resolve(&self, phone: &str) -> Option<String> {
        let payload = Self::lookup_payload(phone);

        let response = self
            .http
            .post(&self.commands_url)
            .header(AUTHORIZATION, &self.api_key)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        let body: Value = match response {
            Ok(r) => match r.json().await {
                Ok(v) => v,
                Err(e) => {
                    tracing::error!(phone, error = %e, "Directory lookup returned malformed JSON");
                    return None;
                }
            },
            Err(e) => {
                tracing::error!(phone, error = %e, "Directory lookup failed");
                return None;
            }
        };

        match body
            .pointer("/resource/alternativeAccount")
            .and_then(Value::as_str)
        {
            Some(identifier) => Some(identifier.to_string()),
            None => {
                tracing::error!(phone, "Directory response missing alternativeAccount");
                None
            }
        }
    }
}

impl MessageSender for GatewayClient {
    async fn send(&self, identifier: &str, message: &str) -> Result<String, String> {
        let payload = self.template_payload(identifier, message);

        let response = self
            .http
            .post(&self.messages_url)
            .header(AUTHORIZATION, &self.api_key)
            .json(&payload)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match response {
            Ok(r) => r.text().await.map_err(|e| {
                tracing::error!(identifier, error = %e, "Failed reading send response");
                e.to_string()
            }),
            Err(e) => {
                tracing::error!(identifier, error = %e, "Message send failed");
                Err(e.to_string())
            }
        }
    }
}
