//! Telegram Bot API gateway.
//!
//! Uses `getMe` as the latency probe and `sendMessage` for delivery. Every
//! call is bounded by the client timeout.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hina_monitor::gateway::{Identity, MessagingGateway, TelegramGateway};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = TelegramGateway::builder()
//!         .token("123456:ABC")
//!         .timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     let me = gateway.get_self_identity().await?;
//!     gateway.send_message(Identity(42), &format!("hello from {}", me)).await?;
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Identity, MessagingGateway};
use crate::error::GatewayError;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Gateway backed by the Telegram Bot HTTP API.
#[derive(Debug, Clone)]
pub struct TelegramGateway {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramGateway {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> TelegramGatewayBuilder {
        TelegramGatewayBuilder::default()
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<T, B>(&self, method: &str, body: Option<&B>) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.method_url(method);
        let request = match body {
            Some(body) => self.client.post(&url).json(body),
            None => self.client.get(&url),
        };

        let response = request.send().await?;
        let status = response.status();

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.without_url().to_string()))?;

        if !envelope.ok {
            let description = envelope
                .description
                .unwrap_or_else(|| format!("API returned status {}", status));
            return Err(match status {
                reqwest::StatusCode::UNAUTHORIZED => {
                    GatewayError::Api(format!("invalid bot token: {}", description))
                }
                _ => GatewayError::Api(description),
            });
        }

        envelope
            .result
            .ok_or_else(|| GatewayError::Parse(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(&self, to: Identity, text: &str) -> Result<(), GatewayError> {
        let body = SendMessage { chat_id: to, text };
        let _: serde_json::Value = self.call("sendMessage", Some(&body)).await?;
        Ok(())
    }

    async fn get_self_identity(&self) -> Result<Identity, GatewayError> {
        let me: BotUser = self.call::<_, ()>("getMe", None).await?;
        Ok(Identity(me.id))
    }
}

/// Builder for TelegramGateway.
#[derive(Debug, Default)]
pub struct TelegramGatewayBuilder {
    token: Option<String>,
    api_base: Option<String>,
    timeout: Option<Duration>,
}

impl TelegramGatewayBuilder {
    /// Set the bot token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the API base URL (default: `https://api.telegram.org`).
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<TelegramGateway, GatewayError> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Api("bot token is required".to_string()))?;

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(10)))
            .build()
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let api_base = self
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(TelegramGateway {
            client,
            api_base,
            token,
        })
    }
}

// Bot API wire types

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    id: i64,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: Identity,
    text: &'a str,
}
