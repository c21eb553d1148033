//! Rate-limited, retrying error reporter.
//!
//! A report goes through four stages:
//! 1. build the [`ErrorReport`](crate::report::ErrorReport)
//! 2. wait for the shared rate gate
//! 3. format the message
//! 4. deliver it, retrying up to `max_retries` times with a fixed delay
//!
//! Every wait races the caller's [`CancellationToken`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::formatter::format_report;
use crate::rate_gate::RateGate;
use crate::report::{Fault, ReportOptions, build_report};
use crate::stack_trace::{BacktraceCapture, StackTraceCapture};
use crate::transport::{TelegramTransport, Transport};
use crate::{Error, Result};

/// Error reporting client. Safe to share between tasks.
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    stack_capture: Arc<dyn StackTraceCapture>,
    rate_gate: RateGate,
    closed: RwLock<bool>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("chat_id", &self.config.chat_id)
            .field("environment", &self.config.environment)
            .field("app_name", &self.config.app_name)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client delivering through the Telegram Bot API.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = TelegramTransport::with_api_base_url(
            config.bot_token.clone(),
            config.timeout(),
            config.api_base_url.clone(),
        )?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client delivering through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let rate_gate = RateGate::new(config.rate_interval());

        Ok(Self {
            config,
            transport,
            stack_capture: Arc::new(BacktraceCapture),
            rate_gate,
            closed: RwLock::new(false),
        })
    }

    /// Replace the stack trace capability.
    pub fn with_stack_capture(mut self, capture: Arc<dyn StackTraceCapture>) -> Self {
        self.stack_capture = capture;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.read()
    }

    /// Report an error to the configured chat.
    ///
    /// Error types without a `From` impl into [`Fault`] are passed as
    /// `Fault::from_error(&err)`.
    pub async fn report_error(
        &self,
        cancel: &CancellationToken,
        error: impl Into<Fault>,
        category: &str,
        options: ReportOptions,
    ) -> Result<()> {
        self.report(cancel, error.into(), category, None, options)
            .await
    }

    /// Report an error; `context` replaces any context set through `options`.
    pub async fn report_error_with_context(
        &self,
        cancel: &CancellationToken,
        error: impl Into<Fault>,
        category: &str,
        context: BTreeMap<String, Value>,
        options: ReportOptions,
    ) -> Result<()> {
        self.report(cancel, error.into(), category, Some(context), options)
            .await
    }

    async fn report(
        &self,
        cancel: &CancellationToken,
        error: Fault,
        category: &str,
        context: Option<BTreeMap<String, Value>>,
        options: ReportOptions,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }

        let mut report = build_report(error, category, options, self.stack_capture.as_ref());
        if let Some(context) = context {
            report.context = context;
        }
        if report.environment.as_deref().is_none_or(str::is_empty)
            && !self.config.environment.is_empty()
        {
            report.environment = Some(self.config.environment.clone());
        }
        if report.app_name.as_deref().is_none_or(str::is_empty) && !self.config.app_name.is_empty()
        {
            report.app_name = Some(self.config.app_name.clone());
        }

        self.rate_gate.wait(cancel).await?;

        let message = format_report(&report, &self.config)?;
        self.deliver(cancel, &message, category).await
    }

    async fn deliver(&self, cancel: &CancellationToken, message: &str, category: &str) -> Result<()> {
        let chat_id = self.config.chat_id;
        let max_retries = self.config.max_retries;

        let mut attempt = 0;
        loop {
            let err = match self.transport.send_message(cancel, chat_id, message).await {
                Ok(()) => {
                    debug!(chat_id, category, attempt, "Error report delivered");
                    return Ok(());
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => e,
            };

            if attempt >= max_retries {
                warn!(
                    chat_id,
                    category,
                    attempts = self.config.max_attempts(),
                    error = %err,
                    "Giving up on error report"
                );
                return Err(Error::DeliveryFailed {
                    attempts: self.config.max_attempts(),
                    source: Box::new(err),
                });
            }

            let delay = self.config.retry_delay();
            warn!(
                chat_id,
                category,
                attempt = attempt + 1,
                max_attempts = self.config.max_attempts(),
                error = %err,
                "Error report delivery failed, retrying in {:?}",
                delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Check that the transport can reach the Bot API.
    pub async fn test_connection(&self, cancel: &CancellationToken) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.transport.test_connection(cancel).await
    }

    /// Close the client. Idempotent.
    ///
    /// Calls waiting at the rate gate fail with [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        let mut closed = self.closed.write();
        if *closed {
            return Ok(());
        }

        *closed = true;
        self.rate_gate.stop();
        info!(chat_id = self.config.chat_id, "Error reporting client closed");
        Ok(())
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.rate_gate.stop();
    }
}
