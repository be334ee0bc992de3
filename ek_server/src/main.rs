//! envkeep server: token authentication and environment-scoped configuration
//! over HTTP, backed by a single SQLite store.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use ek_server::{api, config::ServerConfig, logging, metrics};
use envkeep::{AuthManager, ConfigManager, db::Database};
use pico_args::Arguments;
use tracing::{error, info};

const HELP: &str = "\
Run the envkeep authentication and configuration server

USAGE:
  ek_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or sqlite://envkeep.db]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL                 SQLite connection string
  TOKEN_EXPIRY_HOURS           Lifetime of issued tokens [default: 24]
  TOKEN_PURGE_INTERVAL_SECS    Expired token sweep interval [default: 3600]
  DEFAULT_ENVIRONMENT          development | staging | production [default: production]
  METRICS_BIND                 Prometheus exporter address (disabled when unset)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        info!("Metrics exporter listening on {metrics_bind}");
    }

    info!("Opening database: {}", config.database.database_url);
    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
    db.migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to apply schema: {}", e))?;

    let pool = Arc::new(db.pool().clone());
    let auth_manager = Arc::new(AuthManager::with_token_expiry(
        pool.clone(),
        config.token_expiry()?,
    ));
    let config_manager = Arc::new(ConfigManager::with_default_environment(
        pool.clone(),
        config.default_environment,
    ));

    spawn_token_purge(
        auth_manager.clone(),
        Duration::from_secs(config.token_purge_interval_secs),
    );

    let app = api::create_router(api::AppState {
        auth_manager,
        config_manager,
        pool,
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Periodically delete tokens that have expired on the store's clock
fn spawn_token_purge(auth_manager: Arc<AuthManager>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(e) = auth_manager.purge_expired_tokens().await {
                error!("Expired token purge failed: {e}");
            }
        }
    });
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
