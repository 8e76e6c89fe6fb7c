use anyhow::Result;
use profile_lookup::{build_app, ServiceConfig, SystemClock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Check if we should enable tokio-console
    if std::env::var("TOKIO_CONSOLE").is_ok() {
        console_subscriber::init();
        info!("tokio-console enabled on port 6669");
    } else {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,profile_lookup=debug"));
        fmt().with_env_filter(env_filter).with_target(true).init();
    }

    let config = ServiceConfig::from_env();
    info!("Loaded configuration: {:?}", config);

    let app = build_app(&config, Arc::new(SystemClock))?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let addr = listener.local_addr()?;

    let enabled = config
        .enabled_platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    info!("{}", config.liveness_message());
    info!("Server running on {} (platforms: {})", addr, enabled);
    info!("Upstream timeout: {}s", config.upstream_timeout.as_secs());

    // Handle shutdown signal
    let cancellation_token = CancellationToken::new();
    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, stopping server...");
        }
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await?;

    info!("Clean shutdown complete");
    Ok(())
}
