use clap::{Parser, Subcommand};
use telegramity::Severity;

#[derive(Parser, Debug)]
#[command(author, version, about = "Send error reports to a Telegram chat", long_about = None)]
pub struct Args {
    /// Telegram Bot API token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Chat that receives the reports
    #[arg(long, env = "TELEGRAM_CHAT_ID", allow_hyphen_values = true)]
    pub chat_id: i64,

    /// Bot API call timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Retries after a failed delivery
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Delay between delivery attempts in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub retry_delay: u64,

    /// Maximum number of messages sent per second
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    /// Environment name shown in reports
    #[arg(long, env = "TELEGRAMITY_ENVIRONMENT", default_value = "development")]
    pub environment: String,

    /// Application name shown in reports
    #[arg(long, env = "TELEGRAMITY_APP_NAME", default_value = "telegramity-cli")]
    pub app_name: String,

    /// Application version
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    pub app_version: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify the bot token and connectivity
    Ping,

    /// Send a single error report
    Report {
        /// Error message
        #[arg(short, long)]
        message: String,

        /// Report category (e.g. network, database)
        #[arg(short, long, default_value = "internal")]
        category: String,

        /// Severity: low, medium, high or critical
        #[arg(short, long, default_value = "medium")]
        severity: Severity,

        /// User affected by the error
        #[arg(long)]
        user_id: Option<String>,

        /// Context entry in key=value format (repeatable)
        #[arg(long = "context", value_name = "KEY=VALUE")]
        context: Vec<String>,

        /// Omit the stack trace section
        #[arg(long)]
        no_stack_trace: bool,

        /// Omit the timestamp section
        #[arg(long)]
        no_timestamp: bool,
    },
}
