use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use endlist_api::{parse_allowed_origins, router, AppState, ReconciliationService, ServerConfig};
use endlist_db::{check_capacity, log_pool_metrics, Database, PoolConfig};

/// Initialize tracing with configurable output.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
///   RUST_LOG    - standard env filter (default: "endlist_api=debug,endlist_core=info,tower_http=debug")
fn init_logging() -> Option<WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "endlist_api=debug,endlist_core=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("endlist-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless asked for
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );
    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _file_guard = init_logging();

    let config = ServerConfig::from_env()?;

    let pool_config = PoolConfig::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.request_timeout);
    check_capacity(&pool_config, config.fetch_concurrency);

    let db = Database::connect_with_config(&config.database_url, pool_config).await?;
    info!(subsystem = "database", "Connected to database");

    db.migrate().await?;
    info!(subsystem = "database", "Migrations complete");
    log_pool_metrics(db.pool(), config.fetch_concurrency);

    let service = ReconciliationService::new(
        Arc::new(db.roster.clone()),
        Arc::new(db.attendance.clone()),
    )
    .with_timeout(config.request_timeout)
    .with_concurrency(config.fetch_concurrency);

    let app = router(
        AppState::new(service),
        parse_allowed_origins(&config.allowed_origins),
    );

    let addr: SocketAddr = config.bind_address().parse()?;
    info!(
        request_timeout_secs = config.request_timeout.as_secs(),
        fetch_concurrency = config.fetch_concurrency,
        "Starting server on {}",
        addr
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
