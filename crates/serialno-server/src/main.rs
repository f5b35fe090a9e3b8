#![doc = include_str!("../README.md")]

mod server;

use anyhow::Context;
use clap::Parser;
use serialno::{CounterStore, MemoryStore, RedbStore, SerialService};
use server::config::{CliArgs, ServerConfig};
use server::seed::seed_formats;
use server::service::handler::router;
use server::telemetry::{TelemetryProviders, init_telemetry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    match config.db_path.clone() {
        Some(path) => {
            let store = RedbStore::open(&path)
                .with_context(|| format!("failed to open database at {}", path.display()))?;
            info!(path = %path.display(), "using redb counter store");
            run_server(store, config, providers).await
        }
        None => {
            warn!("DB_PATH not set, formats and counters will not survive a restart");
            run_server(MemoryStore::new(), config, providers).await
        }
    }
}

async fn run_server<S>(
    store: S,
    config: ServerConfig,
    providers: TelemetryProviders,
) -> anyhow::Result<()>
where
    S: CounterStore + 'static,
{
    let service = SerialService::new(store, config.generator.clone());

    if let Some(path) = &config.seed_formats {
        seed_formats(&service, path)?;
    }

    let app = router(Arc::new(service)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    );

    let listener = TcpListener::bind(config.server_addr).await?;
    log_startup_info(&config);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Service shut down successfully");
    providers.shutdown();
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        info!(
            "Starting serial number service on {} with full config: {:#?}",
            config.server_addr, config
        );
    } else {
        info!(
            "Starting serial number service on {} (max retries {}, max candidates {})",
            config.server_addr, config.generator.max_retries, config.generator.max_candidates
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received SIGTERM signal"),
    }

    info!("Shutdown signal received, draining in-flight requests...");
}
