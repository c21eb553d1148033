//! Telegram Bot API transport.
//!
//! Sends messages via `POST /bot<token>/sendMessage` with HTML parse mode and
//! verifies credentials via `GET /bot<token>/getMe`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Transport;
use crate::config::DEFAULT_API_BASE_URL;
use crate::http_client::build_client;
use crate::{Error, Result};

/// Parse mode used for every message.
const PARSE_MODE: &str = "HTML";

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

/// Identity of the bot behind a token, as returned by `getMe`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BotUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram Bot API transport.
pub struct TelegramTransport {
    client: reqwest::Client,
    api_base_url: String,
    bot_token: String,
}

impl fmt::Debug for TelegramTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramTransport")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &"<redacted>")
            .finish()
    }
}

impl TelegramTransport {
    /// Create a transport for the public Bot API endpoint.
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::with_api_base_url(bot_token, timeout, DEFAULT_API_BASE_URL)
    }

    /// Create a transport for a custom Bot API endpoint (e.g. a local Bot API server).
    pub fn with_api_base_url(
        bot_token: impl Into<String>,
        timeout: Duration,
        api_base_url: impl Into<String>,
    ) -> Result<Self> {
        let bot_token = bot_token.into();
        if bot_token.trim().is_empty() {
            return Err(Error::config("bot token cannot be empty"));
        }
        if timeout.is_zero() {
            return Err(Error::config("timeout must be positive"));
        }

        Ok(Self {
            client: build_client(timeout)?,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bot_token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base_url, self.bot_token, method)
    }

    /// Fetch the bot identity behind the token.
    pub async fn get_me(&self, cancel: &CancellationToken) -> Result<BotUser> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let request = self.client.get(self.method_url("getMe"));
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = execute::<BotUser>(request) => result,
        }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        cancel: &CancellationToken,
        chat_id: i64,
        text: &str,
    ) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if text.is_empty() {
            return Err(Error::invalid_argument("message cannot be empty"));
        }
        if chat_id == 0 {
            return Err(Error::invalid_argument("chat ID cannot be zero"));
        }

        let payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": PARSE_MODE,
        });
        let request = self.client.post(self.method_url("sendMessage")).json(&payload);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = execute::<serde_json::Value>(request) => {
                result?;
                debug!(chat_id, "Telegram message sent");
                Ok(())
            }
        }
    }

    async fn test_connection(&self, cancel: &CancellationToken) -> Result<()> {
        let me = self.get_me(cancel).await?;
        debug!(bot_id = me.id, username = ?me.username, "Telegram connection verified");
        Ok(())
    }
}

/// Send a request and unwrap the Bot API envelope.
///
/// Request URLs embed the bot token, so they are stripped from transport errors.
async fn execute<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T> {
    let response = request.send().await.map_err(|e| e.without_url())?;
    let status = response.status();

    let body: ApiResponse<T> = match response.json().await {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(Error::Api {
                code: Some(i64::from(status.as_u16())),
                description: status.to_string(),
            });
        }
        Err(e) => return Err(e.without_url().into()),
    };

    if !body.ok {
        return Err(Error::Api {
            code: body.error_code,
            description: body
                .description
                .unwrap_or_else(|| format!("request failed with HTTP {status}")),
        });
    }

    body.result.ok_or_else(|| Error::Api {
        code: None,
        description: "response is missing `result`".to_string(),
    })
}
