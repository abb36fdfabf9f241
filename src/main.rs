//! Adaptive Cache - interactive console
//!
//! Reads one command per line from stdin and prints one JSON reply per line.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adaptive_cache::repl::{error_reply, execute, Command};
use adaptive_cache::{CacheConfig, CacheManager};

/// Main entry point for the cache console.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the durable store and warm-load the cache
/// 4. Serve commands from stdin until EOF, `quit` or a shutdown signal
/// 5. Dispose the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var.
    // Logs go to stderr so stdout carries only replies.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adaptive_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting adaptive cache console");

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: max_size={}, default_ttl={:?}, compression_threshold={}, sweep_interval={:?}, data_dir={:?}",
        config.max_size,
        config.default_ttl,
        config.compression_threshold,
        config.sweep_interval,
        config.data_dir
    );

    let manager = CacheManager::open(&config)
        .await
        .context("failed to open durable store")?;

    tokio::select! {
        result = serve(&manager) => result?,
        _ = shutdown_signal() => {}
    }

    manager.dispose().await;
    info!("Shutdown complete");
    Ok(())
}

/// Serves commands until EOF or `quit`.
async fn serve(manager: &CacheManager) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let reply = match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(Command::Quit)) => break,
            Ok(Some(command)) => match execute(manager, command).await {
                Ok(reply) => reply,
                Err(e) => error_reply(&e),
            },
            Err(e) => error_reply(&e),
        };
        println!("{}", reply);
    }

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
