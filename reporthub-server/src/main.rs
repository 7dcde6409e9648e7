//! ReportHub API server
//!
//! Entry point wiring configuration, database migrations, the in-process
//! report worker, and the HTTP server together. The queue's lifecycle is
//! owned here: the dispatcher goes into the service, the receiver into the
//! worker task.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use reporthub_db::{create_pool, DbConnectionConfig, DbPool};
use reporthub_queue::InMemoryQueue;
use reporthub_server::state::AppState;
use reporthub_service::ReportRequestService;
use reporthub_worker::SimulatedReportGenerator;

mod tracing_setup;

#[derive(Parser, Debug)]
#[command(name = "reporthub-server", about = "ReportHub API server")]
struct CliArgs {
    /// Path to the configuration file (TOML, YAML, or JSON).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Resolve config path: CLI > environment variable
    let config_path = args
        .config
        .or_else(|| std::env::var("REPORTHUB_CONFIG_PATH").ok());
    let config = reporthub_config::load_config(config_path.as_deref())?;

    tracing_setup::install_tracing(&config.logging);

    let mut db_cfg = DbConnectionConfig::new(&config.database.url);
    db_cfg.max_connections = config.database.max_connections;
    let pool = create_pool(&db_cfg).await?;
    run_migrations(&config.database.url, &pool).await?;

    let (queue, receiver) = InMemoryQueue::channel();
    let service = ReportRequestService::new(pool, Arc::new(queue));

    if config.worker.enabled {
        let worker_service = service.clone();
        tokio::spawn(async move {
            reporthub_worker::run_worker(
                worker_service,
                receiver,
                Arc::new(SimulatedReportGenerator),
            )
            .await;
        });
        tracing::info!("report worker spawned");
    } else {
        // Keep the receiver alive so enqueues still succeed; nothing drains
        // the channel in this instance.
        tracing::warn!("worker disabled; queued jobs will not be processed by this instance");
        tokio::spawn(async move {
            let _receiver = receiver;
            std::future::pending::<()>().await;
        });
    }

    let state = Arc::new(AppState::new(service));
    let app = reporthub_server::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "ReportHub API listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Run database migrations matching the configured backend.
async fn run_migrations(url: &str, pool: &DbPool) -> anyhow::Result<()> {
    let url_lower = url.to_lowercase();

    let migrator = if url_lower.starts_with("postgres") {
        reporthub_migrations::postgres_migrator()
    } else if url_lower.starts_with("mysql") {
        reporthub_migrations::mysql_migrator()
    } else {
        reporthub_migrations::sqlite_migrator()
    };

    migrator
        .run(pool)
        .await
        .map_err(|e| anyhow::anyhow!("failed to apply database migrations: {e}"))?;
    tracing::info!("database migrations applied");
    Ok(())
}
