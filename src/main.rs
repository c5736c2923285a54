//! Admin console gateway server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use admin_gateway::config::Config;
use admin_gateway::{build_state, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting admin gateway");
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Cache TTL: {:?}", config.cache_ttl);

    if config.revalidate_key.is_none() {
        tracing::warn!("No revalidation key configured (ADMIN_REVALIDATE_KEY). /internal/revalidate is disabled");
    }

    let bind_addr = config.bind_addr;
    let state = build_state(config).await?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
