//! Pattern quiz backend entrypoint wiring the catalog, the state slot, the
//! windows and the REST/SSE layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pattern_quiz_back::{
    catalog::{self, Catalog},
    config::{AppConfig, SlotBackend},
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState, clock::SystemClock},
    sync::{FileSlot, MemorySlot, SLOT_KEY, StateSlot},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let catalog = load_catalog(&config)?;
    let slot = open_slot(&config).await?;

    let app_state = AppState::bootstrap(config, catalog, slot, Arc::new(SystemClock)).await;

    tokio::spawn(storage_supervisor::run(app_state.clone()));
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Load the configured catalog directory, or the examples shipped with the binary.
fn load_catalog(config: &AppConfig) -> anyhow::Result<Catalog> {
    let catalog = match config.catalog_dir() {
        Some(dir) => match catalog::load_dir(dir) {
            Ok(catalog) if !catalog.is_empty() => catalog,
            Ok(_) => {
                warn!(dir = %dir.display(), "catalog directory is empty; using built-in examples");
                catalog::builtin().context("loading built-in catalog")?
            }
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "failed to load catalog; using built-in examples");
                catalog::builtin().context("loading built-in catalog")?
            }
        },
        None => catalog::builtin().context("loading built-in catalog")?,
    };
    info!(examples = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Open the state slot selected by the configuration.
async fn open_slot(config: &AppConfig) -> anyhow::Result<Arc<dyn StateSlot>> {
    let slot: Arc<dyn StateSlot> = match config.slot() {
        SlotBackend::File(dir) => {
            let slot = FileSlot::open(dir, SLOT_KEY)
                .await
                .with_context(|| format!("opening state slot in {}", dir.display()))?;
            info!(path = %slot.path().display(), "using file state slot");
            Arc::new(slot)
        }
        SlotBackend::Memory => {
            info!("using in-memory state slot");
            Arc::new(MemorySlot::default())
        }
        SlotBackend::Couch => open_couch_slot().await?,
    };
    Ok(slot)
}

#[cfg(feature = "couch-store")]
async fn open_couch_slot() -> anyhow::Result<Arc<dyn StateSlot>> {
    use pattern_quiz_back::sync::couchdb::{CouchConfig, CouchSlot};

    let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
    let slot = CouchSlot::connect(config, SLOT_KEY)
        .await
        .context("connecting to CouchDB")?;
    info!("using CouchDB state slot");
    Ok(Arc::new(slot))
}

#[cfg(not(feature = "couch-store"))]
async fn open_couch_slot() -> anyhow::Result<Arc<dyn StateSlot>> {
    anyhow::bail!("the CouchDB slot requires the `couch-store` feature")
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
