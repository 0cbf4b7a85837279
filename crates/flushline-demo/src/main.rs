//! flushline-demo — serve the demo site.
//!
//! ```text
//! flushline-demo --port 3000 --config flushline.toml --delay-ms 800
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use flushline::ProgressiveConfig;
use flushline_demo::{AppState, build_router};
use tracing::info;

#[derive(Parser)]
#[command(name = "flushline-demo", about = "Progressive rendering demo server")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value = "3000")]
    port: u16,

    /// TOML file with progressive rendering settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Artificial delay before the feed renders, in milliseconds.
    #[arg(long, default_value = "500")]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flushline=debug,flushline_demo=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let config = ProgressiveConfig::from_file(path)?;
            info!(path = ?path, "config loaded");
            config
        }
        None => ProgressiveConfig::default(),
    };
    info!(
        rules = config.padding.len(),
        capacity = config.channel_capacity,
        "progressive renderer configured"
    );

    let state = AppState::new(config, Duration::from_millis(cli.delay_ms))?;
    let router = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    info!(%addr, "demo server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("demo server stopped");
    Ok(())
}
