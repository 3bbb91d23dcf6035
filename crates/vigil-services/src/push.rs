//! Push notification sender.
//!
//! Reminders go through an Expo-compatible push gateway: one JSON message per
//! request, answered with a ticket that carries either a message id or an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use std::time::Duration;

use vigil_core::Config;

#[async_trait]
pub trait PushSender: Send + Sync {
    /// Send one notification. `Ok(None)` means the gateway accepted the request
    /// without issuing a message id.
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: JsonValue,
    ) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct PushTicketResponse {
    data: Option<PushTicket>,
    #[serde(default)]
    errors: Vec<PushGatewayError>,
}

#[derive(Debug, Deserialize)]
struct PushTicket {
    status: String,
    id: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushGatewayError {
    message: String,
}

pub struct ExpoPushSender {
    http_client: reqwest::Client,
    api_url: String,
    access_token: Option<String>,
}

impl ExpoPushSender {
    pub fn new(api_url: String, access_token: Option<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client for push gateway")?;

        Ok(Self {
            http_client,
            api_url,
            access_token,
        })
    }
}

#[async_trait]
impl PushSender for ExpoPushSender {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: JsonValue,
    ) -> Result<Option<String>> {
        let message = json!({
            "to": token,
            "title": title,
            "body": body,
            "data": data,
            "sound": "default",
        });

        let mut request = self
            .http_client
            .post(&self.api_url)
            .header("Accept", "application/json")
            .json(&message);
        if let Some(access_token) = &self.access_token {
            request = request.bearer_auth(access_token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to push gateway")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Push gateway request failed: {} - {}",
                status,
                error_text
            ));
        }

        let parsed: PushTicketResponse = response
            .json()
            .await
            .context("Failed to parse push gateway response")?;

        if let Some(error) = parsed.errors.first() {
            return Err(anyhow::anyhow!("Push gateway error: {}", error.message));
        }

        match parsed.data {
            Some(ticket) if ticket.status == "ok" => Ok(ticket.id),
            Some(ticket) => Err(anyhow::anyhow!(
                "Push rejected: {}",
                ticket.message.unwrap_or(ticket.status)
            )),
            None => Ok(None),
        }
    }
}

/// Build the configured push sender, or `None` when push is disabled.
pub fn create_push_sender(config: &Config) -> Result<Option<Arc<dyn PushSender>>> {
    if !config.push_enabled {
        tracing::info!("Push notifications disabled");
        return Ok(None);
    }

    let sender = ExpoPushSender::new(
        config.push_api_url.clone(),
        config.push_access_token.clone(),
    )?;
    tracing::info!(api_url = %config.push_api_url, "Push notifications enabled");
    Ok(Some(Arc::new(sender)))
}
