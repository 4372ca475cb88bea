use app_config::SurrealDbConfig;
use app_error::AppError;
use std::sync::Arc;

use crate::{Database, service::DbCredentials};

/// Connect to the configured store and select its namespace/database.
pub async fn initialize_db(db_config: &SurrealDbConfig) -> Result<Arc<Database>, AppError> {
    tracing::debug!("Connecting to SurrealDB: {}", db_config.endpoint);

    if db_config.endpoint.starts_with("wss://") {
        tracing::info!("Using secure TLS connection to database");
    } else if !db_config.endpoint.contains("memory") {
        tracing::warn!("Using non-secure database connection");
    }

    let max_connections = db_config.pool.size;

    tracing::info!(
        "Initializing database connection pool with {} connections",
        max_connections
    );

    let credentials = DbCredentials::new(&db_config.username, &db_config.password);

    let db = Database::initialize(
        &db_config.endpoint,
        max_connections,
        &db_config.namespace,
        &db_config.database,
        &credentials,
    )
    .await
    .map_err(|e| match e {
        AppError::StoreUnavailable(err) => {
            AppError::StoreUnavailable(err.context("Failed to initialize user store"))
        }
        other => other,
    })?;

    tracing::info!("Successfully connected to SurrealDB with connection pool");

    Ok(Arc::new(db))
}

/// In-memory engine for tests that need an isolated store per case.
pub async fn initialize_isolated_memory_db(
    namespace: &str,
    database: &str,
) -> Result<Arc<Database>, AppError> {
    let db = Database::initialize_memory_db(5, namespace, database)
        .await
        .map_err(|e| match e {
            AppError::StoreUnavailable(err) => AppError::StoreUnavailable(
                err.context("Failed to initialize in-memory store")
                    .context(format!("namespace {namespace}, database {database}")),
            ),
            other => other,
        })?;

    Ok(Arc::new(db))
}
