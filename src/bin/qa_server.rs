//! Q&A Server Entry Point
//!
//! Starts the server that answers multipart questions on `POST /api`.

use quiz_agent::{api, QaConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_agent=debug,qa_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = QaConfig::from_env()?;
    info!(
        "Loaded configuration: model={} upload_dir={}",
        config.gateway.model,
        config.upload_dir.display()
    );

    api::serve_qa(config).await?;

    Ok(())
}
