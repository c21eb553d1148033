//! Error reports.
//!
//! An [`ErrorReport`] is one error occurrence destined for delivery. It is
//! built from a [`Fault`], a caller-chosen category and [`ReportOptions`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;
use crate::stack_trace::StackTraceCapture;

/// Well-known report categories.
pub mod category {
    pub const VALIDATION: &str = "validation";
    pub const NETWORK: &str = "network";
    pub const DATABASE: &str = "database";
    pub const AUTH: &str = "auth";
    pub const PAYMENT: &str = "payment";
    pub const INTERNAL: &str = "internal";
    pub const RATE_LIMIT: &str = "rate_limit";
    pub const TIMEOUT: &str = "timeout";
}

/// Caller-assigned urgency of a report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor issues, informational.
    Low,
    /// Moderate issues, warnings.
    #[default]
    Medium,
    /// Important issues, requires attention.
    High,
    /// Requires immediate action.
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(Error::invalid_argument(format!("unknown severity `{other}`"))),
        }
    }
}

/// The error being reported: its message, its cause chain and, when the
/// original error carried one, its backtrace.
///
/// Messages, [`anyhow::Error`], boxed errors and [`std::io::Error`] convert
/// with `into()`. Any other [`std::error::Error`], such as an application's
/// own `thiserror` enum, goes through [`Fault::from_error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fault {
    message: String,
    causes: Vec<String>,
    backtrace: Option<String>,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            causes: Vec::new(),
            backtrace: None,
        }
    }

    /// Capture an error and every error in its `source()` chain.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            message: err.to_string(),
            causes,
            backtrace: None,
        }
    }

    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    pub fn backtrace(&self) -> Option<&str> {
        self.backtrace.as_deref()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        for cause in &self.causes {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&anyhow::Error> for Fault {
    fn from(err: &anyhow::Error) -> Self {
        let mut chain = err.chain();
        let message = chain.next().map(|e| e.to_string()).unwrap_or_default();
        let causes = chain.map(|e| e.to_string()).collect();

        let backtrace = err.backtrace();
        let backtrace = match backtrace.status() {
            std::backtrace::BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        Self {
            message,
            causes,
            backtrace,
        }
    }
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Fault {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::from_error(err.as_ref())
    }
}

impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<std::io::Error> for Fault {
    fn from(err: std::io::Error) -> Self {
        Self::from_error(&err)
    }
}

/// Optional enrichment applied on top of report defaults.
///
/// Setting a field twice keeps the last value; context entries accumulate.
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub severity: Option<Severity>,
    pub user_id: Option<String>,
    /// Replaces the automatically captured stack trace.
    pub stack_trace: Option<String>,
    pub context: BTreeMap<String, Value>,
    pub environment: Option<String>,
    pub app_name: Option<String>,
}

impl ReportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

/// One error occurrence destined for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error: Fault,
    pub category: String,
    pub stack_trace: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub environment: Option<String>,
    pub app_name: Option<String>,
    pub context: BTreeMap<String, Value>,
}

/// Build a report, capturing a stack trace when neither the options nor the
/// fault provide one.
pub fn build_report(
    error: Fault,
    category: impl Into<String>,
    options: ReportOptions,
    capture: &dyn StackTraceCapture,
) -> ErrorReport {
    let ReportOptions {
        severity,
        user_id,
        stack_trace,
        context,
        environment,
        app_name,
    } = options;

    let stack_trace = stack_trace
        .or_else(|| error.backtrace.clone())
        .or_else(|| capture.capture())
        .unwrap_or_default();

    ErrorReport {
        error,
        category: category.into(),
        stack_trace,
        severity: severity.unwrap_or_default(),
        timestamp: Utc::now(),
        user_id,
        environment,
        app_name,
        context,
    }
}
