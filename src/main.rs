use gardenary::api::ApiClient;
use gardenary::commerce::default_catalog;
use gardenary::local_store::LocalStore;
use gardenary::plants::today;
use gardenary::session::Session;
use gardenary::storage::ensure_parent;
use gardenary::{load_data, router, AppState, Config};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    ensure_parent(&config.data_path).await?;
    ensure_parent(&config.storage_path).await?;

    let data = load_data(&config.data_path).await;
    let storage = LocalStore::open(&config.storage_path).await;
    let api = ApiClient::new(config.api_url.clone(), config.backend, storage);
    info!("using the {} backend at {}", api.backend(), config.api_url);

    let session = Arc::new(Session::new(api));
    session.initialize().await;
    Arc::clone(&session).spawn_storage_listener();

    let state = AppState::new(config.data_path, data, session, default_catalog(), today());
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
