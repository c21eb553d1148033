//! Message delivery.
//!
//! A [`Transport`] performs exactly one Bot API call per invocation and never
//! retries; retry policy belongs to the [`Client`](crate::Client).

mod telegram;

pub use telegram::{BotUser, TelegramTransport};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::Result;

/// Trait for message transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a text message to `chat_id`.
    ///
    /// Fails with [`Error::Cancelled`](crate::Error::Cancelled) if `cancel`
    /// fires before the call completes.
    async fn send_message(
        &self,
        cancel: &CancellationToken,
        chat_id: i64,
        text: &str,
    ) -> Result<()>;

    /// Verify credentials and connectivity.
    async fn test_connection(&self, cancel: &CancellationToken) -> Result<()>;
}
