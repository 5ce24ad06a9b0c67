use anyhow::Context;
use api_rest::{AppState, Seed};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the PIMS development backend
///
/// Serves the in-memory stub of the PIMS REST API, seeded from YAML.
///
/// # Environment Variables
/// - `PIMS_STUB_ADDR`: Server address (default: "127.0.0.1:3000")
/// - `PIMS_STUB_SEED`: Seed file (default: the bundled seed)
/// - `PIMS_API_TOKEN`: Token clients must send as `Authorization: Token <key>`
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, seed loading or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pims_run=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PIMS_STUB_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let token = std::env::var("PIMS_API_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .context("PIMS_API_TOKEN must be set")?;

    let seed = match std::env::var("PIMS_STUB_SEED").ok().map(PathBuf::from) {
        Some(path) => {
            tracing::info!("-- Loading seed from {}", path.display());
            Seed::load(&path)?
        }
        None => Seed::bundled()?,
    };

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    api_rest::serve(listener, AppState::new(seed, token)).await?;

    Ok(())
}
