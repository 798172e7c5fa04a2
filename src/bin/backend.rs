use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::signal;
use tokview_tools::config;
use tokview_tools::server::{AppState, router};
use tokview_tools::upstream::UpstreamClient;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config_path = std::env::var("TOKVIEW_CONFIG")
        .unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.to_string());
    let runtime = config::load_runtime_from(&config_path)?;

    let port = std::env::var("TOKVIEW_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(runtime.port);

    std::fs::create_dir_all(&runtime.library_root).with_context(|| {
        format!("creating library root {}", runtime.library_root.display())
    })?;

    let upstream = UpstreamClient::new(&runtime.upstream_api_url)
        .context("initializing upstream client")?;
    let state = AppState::new(
        upstream,
        runtime.library_root.clone(),
        runtime.public_base_url.clone(),
    );

    let app = router(state);

    let addr = SocketAddr::new(runtime.host.parse().context("parsing HOST")?, port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    log::info!("API server listening on http://{}", addr);
    log::info!("library root: {}", runtime.library_root.display());
    log::info!("upstream API: {}", runtime.upstream_api_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        eprintln!("Failed to install Ctrl+C handler: {}", err);
    }
}
