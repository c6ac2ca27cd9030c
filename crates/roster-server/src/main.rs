#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use roster::{NewEntity, Shutdown, Simulated, Store};
use server::config::{CliArgs, ServerConfig};
use server::service::handler::{AppState, router};
use server::service::metered::Metered;
use server::telemetry::init_telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

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

    let store = Arc::new(Store::new());
    if config.seed {
        seed(&store);
    }

    let handler = Arc::new(Metered::new(Simulated::new(config.job_duration)));
    let shutdown = Shutdown::start(config.num_workers, config.queue_capacity, handler);
    let released = shutdown.released();
    let state = AppState::new(Arc::clone(&store), shutdown.producer(), shutdown.token());

    let listener = TcpListener::bind(config.server_addr).await?;
    log_startup_info(&config);

    let coordinator = tokio::spawn(shutdown.run(shutdown_signal()));

    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(released.clone().cancelled_owned())
        .into_future();

    // The server stops accepting once the pool is released, then gets the
    // grace period to finish in-flight requests.
    let grace = config.shutdown_grace;
    tokio::select! {
        res = server => res?,
        () = async {
            released.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("HTTP server did not drain within {:?}, forcing exit", grace);
        }
    }

    let report = coordinator.await?;
    tracing::info!(
        "Service shut down successfully ({} processed, {} failed, {} workers cancelled)",
        report.processed(),
        report.failed(),
        report.cancelled()
    );

    providers.shutdown();
    Ok(())
}

fn seed(store: &Store) {
    store.create(NewEntity::new("1", "Alice", "alice@example.com", "admin"));
    store.create(NewEntity::new("2", "Bob", "bob@example.com", "user"));
    tracing::debug!("Seeded store with {} entities", store.len());
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting roster service on {} with full config: {:#?}",
            config.server_addr,
            config
        );
    } else {
        tracing::info!(
            "Starting roster service on {} with {} workers",
            config.server_addr,
            config.num_workers
        );
    }
}

/// Resolves on the first Ctrl+C or SIGTERM.
///
/// A handler that fails to install is logged and never resolves, leaving the
/// other signal in charge.
async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
