use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use credcheck_common::ProxyConfig;
use credcheck_proxy::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("credcheck=info".parse()?))
        .init();

    let config = ProxyConfig::from_env()?;
    let addr = format!("{}:{}", config.web_host, config.web_port);
    let backend = config.backend_base_url.clone();

    let state = Arc::new(AppState::new(config)?);
    let app = build_router(state);

    info!("Credcheck proxy starting on {addr}");
    info!("Forwarding to {backend}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
