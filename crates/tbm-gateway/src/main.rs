//! tbm-gateway: Telegram Bot Manager main binary
//!
//! REST façade that lets multiple end-users register a Telegram bot token
//! and manage groups through HTTP calls proxied to the Bot API.
//!
//! Usage:
//!   tbm-gateway           - Start the HTTP API server
//!   tbm-gateway --help    - Show help
//!   tbm-gateway --version - Show version

use std::sync::Arc;

use tbm_core::Config;
use tbm_telegram::{BotRegistry, bot_client_factory};
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// HTTP API server
    Server,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("tbm-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Server => {}
    }

    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    // Load configuration (TOML file overridden by environment)
    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    // Initialize logging; DEBUG lowers the default filter
    let default_level = if config.api.debug {
        "debug"
    } else {
        config.log.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.to_string())),
        )
        .init();

    tracing::info!("Starting tbm-gateway...");
    tracing::info!("Bot API base URL: {}", config.telegram.base_url);

    // The registry owns all per-user state; every request handler goes
    // through this one instance
    let registry = Arc::new(BotRegistry::new(bot_client_factory(&config.telegram)));

    let server_config = config.clone();
    let server_registry = Arc::clone(&registry);
    let server = tokio::spawn(async move {
        if let Err(e) = tbm_api::start_server(&server_config, server_registry).await {
            tracing::error!("HTTP API error: {}", e);
        }
    });

    tracing::info!(
        "HTTP API server started on {}:{}",
        config.api.host,
        config.api.port
    );
    tracing::info!("Press Ctrl+C to exit");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    server.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("tbm-gateway - Telegram Bot Manager API");
    println!();
    println!("Usage:");
    println!("  tbm-gateway           Start the HTTP API server");
    println!("  tbm-gateway --help    Show this help message");
    println!("  tbm-gateway --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  HOST                   Bind address (default: 0.0.0.0)");
    println!("  PORT                   HTTP API port (default: 5000)");
    println!("  DEBUG                  Enable debug logging (default: false)");
    println!("  LOG_LEVEL              Log level filter (default: info)");
    println!("  CORS_ORIGINS           Comma-separated CORS allow-list");
    println!("  TELEGRAM_API_URL       Bot API base URL override");
    println!("  TELEGRAM_TIMEOUT_SECS  Per-call timeout (default: 30)");
}
