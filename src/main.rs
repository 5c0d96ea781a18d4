//! Quiz Agent - HTTP Server Entry Point
//!
//! Starts the server that accepts quiz URLs on `POST /solve`.

use quiz_agent::{api, AgentConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AgentConfig::from_env()?;
    info!(
        "Loaded configuration: model={} max_iterations={}",
        config.gateway.model, config.max_iterations
    );

    api::serve_agent(config).await?;

    Ok(())
}
