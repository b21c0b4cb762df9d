use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use carpool_backend::{
    api::{with_security, SecurityMiddlewareConfig, SecurityState},
    config::AppConfig,
    database::{DatabasePool, MemoryUserStore, UserStore},
    Services,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {:#}", e);
        e
    })?;

    init_logging(&config)?;

    info!("Starting carpool backend");
    info!(
        "Settings: auth enabled: {}, postgres enabled: {}, min_votes: {}",
        config.security.enable_auth, config.database.postgres_enabled, config.reputation.min_votes
    );

    let store = create_store(&config).await?;
    let services = Services::new(store, &config);

    let security_state = SecurityState::new(SecurityMiddlewareConfig::from_config(&config));
    if config.security.enable_auth {
        info!("Loaded {} API key(s)", config.security.api_keys.len());
    } else {
        warn!("API key authentication disabled");
    }

    spawn_housekeeping(&services, &security_state, &config);

    let app = with_security(services.router(), security_state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", bind_addr, e))?;

    info!("Listening on {}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

/// PostgreSQL when enabled, otherwise the in-memory store
async fn create_store(config: &AppConfig) -> Result<Arc<dyn UserStore>> {
    if !config.database.postgres_enabled {
        warn!("PostgreSQL disabled - users are kept in memory and lost on restart");
        return Ok(Arc::new(MemoryUserStore::new()));
    }

    let db = DatabasePool::new(
        &config.database.postgres_url,
        config.database.max_connections,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;
    db.init_schema()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize schema: {}", e))?;

    Ok(db.users())
}

/// Periodic eviction of expired verification codes and idle rate-limit entries
fn spawn_housekeeping(services: &Services, security: &SecurityState, config: &AppConfig) {
    let codes = services.codes.clone();
    let rate_limiter = security.rate_limiter.clone();
    let period = Duration::from_secs(config.verification.purge_interval_secs);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = codes.purge_expired();
            let idle = rate_limiter.cleanup();
            if evicted > 0 || idle > 0 {
                info!(evicted_codes = evicted, idle_clients = idle, "Housekeeping pass");
            }
        }
    });
}
