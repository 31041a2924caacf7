use std::time::Duration;

use anyhow::Result;
use trails_api::{build_router, ApiConfig, ApiState};
use trails_observability::init_tracing;

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("trails_api");

    let config = ApiConfig::from_env();
    let state = ApiState::from_config(&config)?;

    let agent = state.agent.clone();
    let limiter = state.limiter.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
        loop {
            ticker.tick().await;
            if let Err(error) = agent.purge_expired_sessions().await {
                tracing::warn!(error = ?error, "session purge failed");
            }
            let forgotten = limiter.forget_idle();
            tracing::debug!(forgotten, "idle rate-limit entries dropped");
        }
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        origins = config.allowed_origins.len(),
        "trails api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
