use cuberoom::prelude::*;
use cuberoom_server::{CubeRoom, ServerConfig, health};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Cuberoom server v{}", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig::load_or_default();
    info!(?config, "configuration loaded");

    let health_listener = TcpListener::bind(config.health_addr()).await?;
    tokio::spawn(async move {
        if let Err(e) = health::serve(health_listener).await {
            error!(error = %e, "health endpoint stopped");
        }
    });

    let server = CuberoomServerBuilder::new()
        .bind(&config.ws_addr())
        .room_name(&config.room_name)
        .idle_timeout(config.idle_timeout)
        .build::<CubeRoom>()
        .await?;

    info!(
        addr = %server.local_addr()?,
        room_name = %config.room_name,
        "listening for WebSocket clients"
    );

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
