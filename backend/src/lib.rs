//! Todo list server.
//!
//! Serves the JSON API under `/api/todos`, liveness and readiness probes at
//! `/health` and `/ready`, and the built frontend for every other path.
//!
//! # Configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `3000` |
//! | `REDIS_URL` | `redis://127.0.0.1:6379` |
//! | `TODO_STORE` | `redis` (or `memory`) |
//! | `STATIC_DIR` | `frontend/dist` |
//!
//! Log verbosity follows `RUST_LOG`.
//!
//! ```sh
//! RUST_LOG=info,tower_http=debug cargo run -p backend
//! ```

use axum::Router;
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod error;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

use config::{Config, StoreKind};
use error::StartupError;
use state::AppState;
use store::{MemoryStore, RedisStore, TodoStore};

pub async fn start_server() -> Result<(), StartupError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = Config::load()?;

    match config.store {
        StoreKind::Redis => {
            let store = RedisStore::connect(&config.redis_url).await?;
            serve(config, store).await
        }
        StoreKind::Memory => {
            info!("Using in-memory store, todos will not survive a restart");
            serve(config, MemoryStore::new()).await
        }
    }
}

/// The full application: API routes, static frontend, CORS and request tracing.
pub fn app<S: TodoStore>(state: AppState<S>, config: &Config) -> Router {
    routes::router(state)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn serve<S: TodoStore>(config: Config, store: S) -> Result<(), StartupError> {
    let app = app(AppState::new(store), &config);

    let address = format!("0.0.0.0:{}", config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => error!("Failed to install Ctrl+C handler: {e}"),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
