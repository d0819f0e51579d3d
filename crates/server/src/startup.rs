use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, StorageConfig};
use service::counter::{FileCounterStore, SharedCounterStore};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, AppState};

/// All origins may call the API.
fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// File-backed store for the configured clicks file.
pub fn build_store(storage: &StorageConfig) -> FileCounterStore {
    FileCounterStore::new(storage.clicks_file.clone())
        .with_serialized_increments(storage.serialize_increments)
}

/// Router wired to the given store, with CORS and tracing layers.
pub fn build_app(store: SharedCounterStore) -> Router {
    routes::build_router(AppState { store }, build_cors())
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    let raw = cfg.server.bind_addr();
    raw.parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bad bind address {raw}: {e}")))
}

fn log_banner(cfg: &AppConfig, store: &FileCounterStore, addr: &SocketAddr) {
    let data_file = std::path::absolute(store.path())
        .unwrap_or_else(|_| store.path().to_path_buf());
    info!(path = %data_file.display(), "click data will be stored here");
    info!(%addr, serialize_increments = cfg.storage.serialize_increments, "starting click counter");
    info!("  GET  /api/clicks - current click count");
    info!("  POST /api/clicks - increment click count");
    info!("  GET  /api/health - health check");
    info!("  GET  /metrics    - prometheus metrics");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, shutting down");
    }
}

/// Public entry: build the app and serve until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    common::env::ensure_data_dir(&cfg.storage.clicks_file).await?;

    let store = build_store(&cfg.storage);
    let addr = bind_addr(&cfg)?;
    log_banner(&cfg, &store, &addr);
    let app = build_app(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_rejects_non_ip_host() {
        let mut cfg = AppConfig::default();
        cfg.server.host = "not an ip".into();
        assert!(matches!(bind_addr(&cfg), Err(StartupError::InvalidConfig(_))));
    }

    #[test]
    fn store_follows_storage_config() {
        let mut cfg = AppConfig::default();
        cfg.storage.clicks_file = "data/counter.json".into();
        let store = build_store(&cfg.storage);
        assert_eq!(store.path(), std::path::Path::new("data/counter.json"));
    }

    #[test]
    fn bind_addr_from_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(bind_addr(&cfg).unwrap().port(), 5000);
    }
}
