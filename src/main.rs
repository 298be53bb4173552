//! Bracket Back binary entrypoint wiring the REST layer, the bracket engine and storage.

use std::{env, net::SocketAddr, str::FromStr, sync::Arc};

use anyhow::{Context, bail};
use axum::Router;
use bracket_back::{
    config::AppConfig,
    dao::{
        storage::StorageError,
        tournament_store::{TournamentStore, memory::MemoryTournamentStore},
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Persistence backend selected through `STORAGE_BACKEND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageBackend {
    Mongo,
    Couch,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "couch" | "couchdb" => Ok(Self::Couch),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown storage backend `{other}` (expected mongo, couch or memory)"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_config = AppConfig::load();
    let backend = env::var("STORAGE_BACKEND")
        .map(|value| value.parse::<StorageBackend>())
        .unwrap_or(Ok(StorageBackend::Mongo))
        .context("reading STORAGE_BACKEND")?;

    let app_state = AppState::new(app_config);
    start_storage(&app_state, backend).await?;

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, ?backend, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Install the memory store directly, or hand database backends to the storage supervisor.
async fn start_storage(state: &SharedState, backend: StorageBackend) -> anyhow::Result<()> {
    match backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage; tournaments are lost on restart");
            state
                .set_tournament_store(Arc::new(MemoryTournamentStore::new()))
                .await;
        }
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            tokio::spawn(storage_supervisor::run(state.clone(), connect_mongo));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            tokio::spawn(storage_supervisor::run(state.clone(), connect_couch));
        }
        #[allow(unreachable_patterns)]
        other => bail!("storage backend {other:?} is not compiled into this binary"),
    }
    Ok(())
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> Result<Arc<dyn TournamentStore>, StorageError> {
    use bracket_back::dao::tournament_store::mongodb::{MongoConfig, MongoTournamentStore};

    let config = MongoConfig::from_env().await?;
    let store = MongoTournamentStore::connect(config).await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "couch-store")]
async fn connect_couch() -> Result<Arc<dyn TournamentStore>, StorageError> {
    use bracket_back::dao::tournament_store::couchdb::{CouchConfig, CouchTournamentStore};

    let config = CouchConfig::from_env()?;
    let store = CouchTournamentStore::connect(config).await?;
    Ok(Arc::new(store))
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
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
