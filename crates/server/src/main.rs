use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use herald_audit::IntegrationLogStore;
use herald_audit_memory::MemoryLogStore;
use herald_dispatch::{
    DispatchMetrics, DispatchPipeline, DispatchQueue, DispatchWorker, SubscriberIntake,
    builtin_registry,
};
use herald_server::api::AppState;
use herald_server::config::HeraldConfig;
use herald_store::EntityStore;
use herald_store_memory::MemoryEntityStore;

/// Herald subscriber intake and integration dispatch server.
#[derive(Parser, Debug)]
#[command(name = "herald-server", about = "Standalone HTTP server for Herald")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "herald.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = Path::new(&cli.config);
    let config = HeraldConfig::load(config_path)?;
    herald_server::telemetry::init(&config.logging);

    if !config_path.exists() {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    // The registry is complete before any traffic and read-only afterwards.
    let registry = Arc::new(builtin_registry()?);
    info!(kinds = ?registry.kinds(), "provider registry initialized");

    let store: Arc<dyn EntityStore> = Arc::new(MemoryEntityStore::new());
    let logs: Arc<dyn IntegrationLogStore> = Arc::new(MemoryLogStore::new());
    herald_server::seed::load_seeds(&config, store.as_ref(), &registry).await?;

    let metrics = Arc::new(DispatchMetrics::default());
    let pipeline = DispatchPipeline::builder()
        .store(Arc::clone(&store))
        .log_store(Arc::clone(&logs))
        .registry(Arc::clone(&registry))
        .timeout(config.dispatch.timeout())
        .metrics(Arc::clone(&metrics))
        .build()?;

    let (queue, rx) = DispatchQueue::channel(config.dispatch.queue_capacity);
    let worker = DispatchWorker::spawn(Arc::new(pipeline), rx, config.dispatch.max_concurrent);

    let state = AppState {
        intake: Arc::new(SubscriberIntake::new(Arc::clone(&store), queue)),
        store,
        registry,
        logs,
        metrics,
    };
    let app = herald_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "herald-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Drain queued and in-flight dispatches (with configurable timeout).
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        timeout_secs = config.server.shutdown_timeout_seconds,
        in_flight = worker.in_flight(),
        "waiting for pending dispatches..."
    );
    if tokio::time::timeout(shutdown_timeout, worker.shutdown())
        .await
        .is_err()
    {
        warn!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "shutdown timeout exceeded, some dispatches may be left pending"
        );
    }

    info!("herald-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
