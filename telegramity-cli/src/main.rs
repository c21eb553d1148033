mod cli;
mod params;

use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use telegramity::{CancellationToken, Client, ClientConfig, ReportOptions, TelegramTransport};
use tracing::{Level, error, info, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::cli::{Args, Commands};
use crate::params::parse_context;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; variables may come from the real environment.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args).await {
        error!("Application error: {e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let config = ClientConfig::builder(args.bot_token, args.chat_id)
        .timeout(Duration::from_secs(args.timeout))
        .max_retries(args.retries)
        .retry_delay(Duration::from_millis(args.retry_delay))
        .rate_limit(args.rate_limit)
        .environment(args.environment)
        .app_info(args.app_name, args.app_version)
        .build();

    match args.command {
        Commands::Ping => {
            let transport = TelegramTransport::with_api_base_url(
                config.bot_token.clone(),
                config.timeout(),
                config.api_base_url.clone(),
            )?;
            let me = transport
                .get_me(&cancel)
                .await
                .context("Failed to reach the Telegram Bot API")?;
            println!(
                "Connected as {} (@{}, id {})",
                me.first_name,
                me.username.as_deref().unwrap_or("-"),
                me.id
            );
        }

        Commands::Report {
            message,
            category,
            severity,
            user_id,
            context,
            no_stack_trace,
            no_timestamp,
        } => {
            let config = ClientConfig {
                include_stack_trace: !no_stack_trace,
                include_timestamp: !no_timestamp,
                ..config
            };
            let client = Client::new(config)?;

            let mut options = ReportOptions::new().severity(severity);
            if let Some(user_id) = user_id {
                options = options.user_id(user_id);
            }
            options.context = parse_context(&context)?;

            let result = client
                .report_error(&cancel, message, &category, options)
                .await
                .context("Failed to deliver error report");
            client.close()?;
            result?;

            info!(category = %category, "Error report delivered");
            println!("Report sent to chat {}", client.config().chat_id);
        }
    }

    Ok(())
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            cancel.cancel();
        }
    });
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}
