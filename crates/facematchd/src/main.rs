use anyhow::{Context, Result};
use facematch_core::OnnxFaceEmbedder;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod http;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        listen = %config.listen_addr,
        model_dir = %config.model_dir.display(),
        threshold = config.match_threshold,
        queue_depth = config.queue_depth,
        "facematchd starting"
    );

    // Models load once, before the socket opens.
    let embedder_config = config.embedder();
    let embedder = tokio::task::spawn_blocking(move || OnnxFaceEmbedder::load(&embedder_config))
        .await?
        .context("loading face models")?;
    tracing::info!(model = facematch_core::MODEL_NAME, "face models loaded");

    let engine = engine::spawn_engine(embedder, config.policy(), config.queue_depth)?;
    let app = http::create_app(http::AppState::new(engine), config.body_limit_bytes());

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "facematchd ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
        })
        .await?;

    tracing::info!("facematchd shutting down");
    Ok(())
}
