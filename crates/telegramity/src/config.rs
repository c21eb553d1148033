//! Client configuration.
//!
//! [`ClientConfig`] is a plain struct with documented defaults. It can be
//! written as a named-field literal (`..Default::default()`), built through
//! [`ClientConfigBuilder`], or deserialized from an application config file.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default Telegram Bot API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Telegram `sendMessage` text limit (UTF-8 characters).
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Configuration snapshot for a [`Client`](crate::Client).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Telegram Bot API token (from @BotFather).
    pub bot_token: String,
    /// Chat that receives error reports.
    pub chat_id: i64,
    /// Timeout for a single Bot API call, in milliseconds.
    pub timeout_ms: u64,
    /// Retries after the first failed delivery attempt.
    pub max_retries: u32,
    /// Fixed delay between delivery attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Maximum number of messages started per second.
    pub rate_limit_per_second: u32,
    /// Maximum length of a formatted message, in characters.
    pub max_message_length: usize,
    /// Whether to render the stack trace section.
    pub include_stack_trace: bool,
    /// Whether to render the timestamp section.
    pub include_timestamp: bool,
    /// Environment name (dev, staging, prod).
    pub environment: String,
    /// Application name.
    pub app_name: String,
    /// Application version.
    pub app_version: String,
    /// Bot API base URL, without trailing slash.
    pub api_base_url: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("rate_limit_per_second", &self.rate_limit_per_second)
            .field("max_message_length", &self.max_message_length)
            .field("include_stack_trace", &self.include_stack_trace)
            .field("include_timestamp", &self.include_timestamp)
            .field("environment", &self.environment)
            .field("app_name", &self.app_name)
            .field("app_version", &self.app_version)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: 0,
            timeout_ms: 30_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
            rate_limit_per_second: 1,
            max_message_length: TELEGRAM_MESSAGE_LIMIT,
            include_stack_trace: true,
            include_timestamp: true,
            environment: "development".to_string(),
            app_name: "unknown".to_string(),
            app_version: "1.0.0".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Start a builder with the two required fields set.
    pub fn builder(bot_token: impl Into<String>, chat_id: i64) -> ClientConfigBuilder {
        ClientConfigBuilder::new(bot_token, chat_id)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Interval between two rate gate ticks.
    pub fn rate_interval(&self) -> Duration {
        Duration::from_secs(1) / self.rate_limit_per_second.max(1)
    }

    /// Total delivery attempts per report.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check the fields a client cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            return Err(Error::config("bot token is required"));
        }
        if self.chat_id == 0 {
            return Err(Error::config("chat ID is required"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("timeout must be positive"));
        }
        if self.rate_limit_per_second == 0 {
            return Err(Error::config("rate limit must be at least 1 message per second"));
        }
        if self.rate_interval().is_zero() {
            return Err(Error::config(format!(
                "rate limit of {} messages per second is too high",
                self.rate_limit_per_second
            )));
        }
        if self.max_message_length == 0 {
            return Err(Error::config("max message length must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new(bot_token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            config: ClientConfig {
                bot_token: bot_token.into(),
                chat_id,
                ..Default::default()
            },
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn rate_limit(mut self, per_second: u32) -> Self {
        self.config.rate_limit_per_second = per_second;
        self
    }

    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.config.environment = env.into();
        self
    }

    pub fn app_info(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.config.app_name = name.into();
        self.config.app_version = version.into();
        self
    }

    /// Message rendering switches and the length cap.
    pub fn message_config(
        mut self,
        include_stack_trace: bool,
        include_timestamp: bool,
        max_length: usize,
    ) -> Self {
        self.config.include_stack_trace = include_stack_trace;
        self.config.include_timestamp = include_timestamp;
        self.config.max_message_length = max_length;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Finish without validating; validation happens at client construction.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
