mod mailer;
mod routes;
mod state;

use std::fs::{self, File};
use std::net::SocketAddr;

use anyhow::{bail, Context, Result};
use axum::Router;
use fs2::FileExt;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

use kith_core::config::GlobalConfig;

use crate::state::AppState;

/// Holds the exclusive server lock for as long as it lives.
struct ServerLock {
    _file: File,
}

/// One server per data directory: the lock file sits beside the
/// database it guards, so two instances can never share a store.
fn acquire_lock(config: &GlobalConfig) -> Result<ServerLock> {
    let data_dir = config.data_path();
    fs::create_dir_all(&data_dir)?;
    let path = data_dir.join("server.lock");

    let file = File::create(&path)
        .with_context(|| format!("Failed to create lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        bail!(
            "Another kith-server is already serving {}.\n\
            If you believe this is an error, remove: {}",
            data_dir.display(),
            path.display()
        );
    }

    Ok(ServerLock { _file: file })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = GlobalConfig::load()?;

    // Ensure only one instance runs against this store
    let _lock = acquire_lock(&config)?;

    let port = config.port;
    let state = AppState::new(config)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::circles::router())
        .merge(routes::join::router())
        .merge(routes::events::router())
        .merge(routes::notifications::router())
        .merge(routes::family::router())
        .merge(routes::profile::router())
        .with_state(state)
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("kith-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
