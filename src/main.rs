use axum::{routing::get, Router};
use std::{error::Error, sync::Arc};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use kana_tiles::config::Config;
use kana_tiles::dictionary::Dictionary;
use kana_tiles::error::ConfigError;
use kana_tiles::handlers::Handle;
use kana_tiles::models::RoomRegistry;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;

    let dictionary = Dictionary::new(&config.dictionary_path).map_err(|source| {
        ConfigError::Dictionary {
            path: config.dictionary_path.clone(),
            source,
        }
    })?;
    let registry = RoomRegistry::new(Arc::new(dictionary));

    let app = Router::new()
        .route("/ws", get(Handle::websocket))
        .route("/health", get(Handle::health))
        .nest_service("/static", ServeDir::new(&config.static_files_path))
        .with_state(registry);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
