use api::{AppState, InMemoryStore, app_builder, config::Config};
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;

    // set up logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if cfg.delete_token.is_none() {
        tracing::warn!("no delete token configured, DELETE /api/logs is unguarded");
    }

    let addr = SocketAddr::from((cfg.address, cfg.port));
    let app = app_builder(AppState::new(InMemoryStore::default(), cfg));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Log service running on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
