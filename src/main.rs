use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vidtube_api::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{S3StorageClient, StorageService, StorageState},
};

/// main
///
/// Loads configuration, sets up logging, connects and migrates the database, builds the
/// media host client and serves the API until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration (fails fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load().context("failed to load configuration")?;

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vidtube_api=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Database
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.db_url)
        .await
        .context("failed to connect to Postgres, check DATABASE_URL")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("database migrations applied");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Media host
    let s3_client = S3StorageClient::new(
        &config.media_endpoint,
        &config.media_region,
        &config.media_access_key,
        &config.media_secret_key,
        &config.media_bucket,
        &config.media_public_url,
    );

    // Local MinIO setups start without a bucket.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }

    let storage = Arc::new(s3_client) as StorageState;

    // 5. Server
    let port = config.port;
    let app = create_router(AppState {
        repo,
        storage,
        config,
    });

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("shutdown signal received");
}
