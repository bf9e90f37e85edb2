use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tracker_bridge::config::BridgeConfig;
use tracker_bridge::server::{build_router, AppState};
use tracker_bridge::store::memory::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracker_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BridgeConfig::from_env()?;

    if config.webhook_secret.is_none() {
        tracing::warn!("BRIDGE_WEBHOOK_SECRET is not set; all deliveries will be rejected");
    }

    let store = MemoryStore::new();
    let app_state = AppState::new(config.clone(), Arc::new(store));
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "tracker bridge listening");

    axum::serve(listener, app).await?;

    Ok(())
}
