use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod resize;
mod routes;
mod store;

use config::Config;
use routes::AppState;
use store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let config = Config::parse();

    let store = Store::open(&config.database_url(), config.images_dir()).await?;
    let state = Arc::new(AppState {
        store,
        resize: config.resize_settings(),
    });
    let app = routes::router(state, &config.public_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!(addr = %config.bind, public = %config.public_dir.display(), uploads = %config.images_dir().display(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
