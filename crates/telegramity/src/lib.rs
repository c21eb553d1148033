//! Telegramity: report application errors to a Telegram chat.
//!
//! Errors are turned into structured reports, rendered as HTML messages and
//! delivered through the Telegram Bot API. Delivery is rate limited and
//! retried with a fixed delay.
//!
//! # Example
//!
//! ```no_run
//! use telegramity::{CancellationToken, Client, ClientConfig, ReportOptions, Severity, category};
//!
//! # async fn run() -> telegramity::Result<()> {
//! let config = ClientConfig::builder("123456:ABC-DEF", -1001234567890)
//!     .environment("production")
//!     .app_info("billing", "2.3.0")
//!     .build();
//! let client = Client::new(config)?;
//!
//! let cancel = CancellationToken::new();
//! client
//!     .report_error(
//!         &cancel,
//!         "connection refused",
//!         category::DATABASE,
//!         ReportOptions::new()
//!             .severity(Severity::Critical)
//!             .user_id("u1"),
//!     )
//!     .await?;
//!
//! client.close()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod formatter;
pub mod global;
mod http_client;
mod rate_gate;
pub mod report;
pub mod stack_trace;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, Result};
pub use global::{Registry, close_global, global, init_global, try_global};
pub use report::{ErrorReport, Fault, ReportOptions, Severity, build_report, category};
pub use stack_trace::{BacktraceCapture, NoopCapture, StackTraceCapture};
pub use transport::{BotUser, TelegramTransport, Transport};

pub use tokio_util::sync::CancellationToken;
