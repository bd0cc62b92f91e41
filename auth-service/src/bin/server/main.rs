use std::sync::Arc;

use auth::Authenticator;
use auth_service::cache::InMemoryCredentialCache;
use auth_service::cache::RedisCredentialCache;
use auth_service::config::Config;
use auth_service::credential::ports::LoginServicePort;
use auth_service::credential::service::LoginService;
use auth_service::inbound::http::router::create_router;
use auth_service::repositories::PostgresCredentialStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "auth-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        cache = if config.cache.url.is_some() { "redis" } else { "memory" },
        cache_ttl_seconds = config.cache.ttl_seconds,
        token_lifetime_minutes = config.jwt.expiration_minutes,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(
        &config.jwt.private_key_pem()?,
        &config.jwt.public_key_pem()?,
        config.jwt.token_lifetime(),
    )?);

    let credential_store = Arc::new(PostgresCredentialStore::new(
        pg_pool,
        config.database.connect_attempts,
        config.database.retry_delay(),
    ));

    let login_service: Arc<dyn LoginServicePort> = match &config.cache.url {
        Some(url) => match RedisCredentialCache::connect(url, config.cache.timeout()).await {
            Ok(cache) => Arc::new(LoginService::new(
                credential_store,
                Arc::new(cache),
                authenticator,
                config.cache.ttl(),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unreachable, using in-memory credential cache");
                Arc::new(LoginService::new(
                    credential_store,
                    Arc::new(InMemoryCredentialCache::new()),
                    authenticator,
                    config.cache.ttl(),
                ))
            }
        },
        None => Arc::new(LoginService::new(
            credential_store,
            Arc::new(InMemoryCredentialCache::new()),
            authenticator,
            config.cache.ttl(),
        )),
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(login_service);

    if let Err(e) = axum::serve(http_listener, http_application).await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    tracing::info!("Server exited successfully");
    Ok(())
}
