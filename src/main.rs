use outreach_tracker::{remote::HttpRemote, router, AppConfig, AppState, EntryStore};
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env()?;
    let deriver = config.deriver();
    let zones = deriver
        .targets()
        .iter()
        .map(|zone| format!("{}={}", zone.label, zone.tz.name()))
        .collect::<Vec<_>>()
        .join(",");
    info!(
        endpoint = %config.remote_endpoint,
        offset = %deriver.source_offset(),
        %zones,
        "starting outreach tracker"
    );

    let remote = HttpRemote::new(config.remote_endpoint.clone(), config.remote_timeout)?;
    let mut store = EntryStore::new(Arc::new(remote), deriver);
    store.load().await;

    let app = router(AppState::new(store));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
