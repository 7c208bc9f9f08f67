use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::Server;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use pothole_service::config::Config;
use pothole_service::handlers::websocket_sink::WebSocketSink;
use pothole_service::routes::router;
use pothole_service::service;
use pothole_service::store::InMemoryPotholeStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pothole_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::init();
    let state = service::spawn(&config, Arc::new(InMemoryPotholeStore::new()), Arc::new(WebSocketSink));

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("listening on {}", addr);
    Server::bind(&addr)
        .serve(router(state).into_make_service())
        .await?;
    Ok(())
}
