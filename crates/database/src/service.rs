use crate::{ConnectionPool, Database, PooledConnection, SessionScope};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{marker::PhantomData, sync::Arc, sync::Mutex, time::Duration};
use surrealdb::{engine::any::Any, opt::auth::Root};
use tokio::time::timeout;

use app_error::{AppError, AppErrorExt, AppResult};

impl ConnectionPool {
    pub fn new(connection_url: &str, max_size: usize) -> Self {
        Self {
            connection_url: connection_url.to_string(),
            connections: Mutex::new(Vec::with_capacity(max_size)).into(),
            max_size,
            session: None,
        }
    }

    /// Every connection the pool opens from here on is signed in (when
    /// credentials are given) and scoped to the namespace/database.
    pub fn with_session(mut self, scope: SessionScope) -> Self {
        self.session = Some(scope);
        self
    }

    /// Get a connection from the pool or create a new one if needed.
    /// Pooled connections are health-checked before reuse; stale ones are
    /// dropped rather than returned.
    pub async fn get_connection(&self) -> AppResult<PooledConnection> {
        // Try to get an existing connection from the pool with a single lock operation
        let conn_opt: Option<surrealdb::Surreal<Any>> = {
            let mut connections = self.connections.lock().map_err(|e| {
                AppError::ServerError(anyhow::anyhow!(
                    "Failed to lock connection pool mutex: {}",
                    e
                ))
            })?;
            connections.pop()
        };

        if let Some(conn) = conn_opt {
            match timeout(Duration::from_secs(2), conn.health()).await {
                Ok(Ok(_)) => {
                    return Ok(PooledConnection {
                        conn: Some(conn),
                        pool: self,
                    });
                }
                _ => {
                    tracing::debug!("Discarding invalid connection from pool");
                    // Not returning to pool - let it drop
                }
            }
        }

        let conn_future = surrealdb::engine::any::connect(&self.connection_url);
        let new_conn = match timeout(Duration::from_secs(5), conn_future).await {
            Ok(conn_result) => conn_result
                .context("Failed to connect to database")
                .store_err()?,
            Err(_) => {
                return Err(AppError::StoreUnavailable(anyhow::anyhow!(
                    "Database connection timeout - could not establish connection within 5 seconds"
                )));
            }
        };

        if let Some(scope) = &self.session {
            if let Some(credentials) = &scope.credentials {
                new_conn
                    .signin(Root {
                        username: credentials.get_username(),
                        password: credentials.get_password(),
                    })
                    .await
                    .context("Failed to authenticate with database")
                    .store_err()?;
            }

            new_conn
                .use_ns(&scope.namespace)
                .use_db(&scope.database)
                .await
                .context("Failed to select namespace and database")
                .store_err()?;
        }

        Ok(PooledConnection {
            conn: Some(new_conn),
            pool: self,
        })
    }

    pub fn return_connection(&self, conn: surrealdb::Surreal<Any>) {
        if let Ok(mut connections) = self.connections.lock() {
            if connections.len() < self.max_size {
                connections.push(conn);
                return;
            }
        }
        // If we can't lock the mutex or the pool is full, the connection will be dropped
    }
}

#[derive(Clone)]
pub struct DbCredentials {
    username: String,
    password: String,
}

impl DbCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn get_username(&self) -> &str {
        &self.username
    }

    pub fn get_password(&self) -> &str {
        &self.password
    }
}

// Don't accidentally log credentials
impl std::fmt::Debug for DbCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Database {
    pub fn new(connection_url: &str, max_connections: usize) -> Self {
        if !connection_url.starts_with("ws://")
            && !connection_url.starts_with("wss://")
            && !connection_url.contains("memory")
        {
            tracing::warn!(
                "Potentially invalid database connection URL format: {}",
                connection_url
            );
        }

        let pool = ConnectionPool::new(connection_url, max_connections);
        Self { pool }
    }

    pub async fn get_connection(&self) -> AppResult<PooledConnection> {
        self.pool.get_connection().await
    }

    pub async fn initialize(
        connection_url: &str,
        max_connections: usize,
        namespace: &str,
        database: &str,
        credentials: &DbCredentials,
    ) -> AppResult<Self> {
        if namespace.trim().is_empty() {
            return Err(AppError::ValidationFailed(
                "Database namespace cannot be empty".into(),
            ));
        }

        if database.trim().is_empty() {
            return Err(AppError::ValidationFailed(
                "Database name cannot be empty".into(),
            ));
        }

        let Database { pool } = Self::new(connection_url, max_connections);
        let db = Self {
            pool: pool.with_session(SessionScope {
                namespace: namespace.to_string(),
                database: database.to_string(),
                credentials: Some(credentials.clone()),
            }),
        };

        // Open one connection eagerly so misconfiguration fails at startup
        let _conn = db.get_connection().await?;
        drop(_conn);

        Ok(db)
    }

    pub async fn initialize_memory_db(
        max_connections: usize,
        namespace: &str,
        database: &str,
    ) -> AppResult<Self> {
        let Database { pool } = Self::new("memory", max_connections);
        let db = Self {
            pool: pool.with_session(SessionScope {
                namespace: namespace.to_string(),
                database: database.to_string(),
                credentials: None,
            }),
        };

        let _conn = db.get_connection().await?;
        drop(_conn);

        Ok(db)
    }

    pub fn create<T>(&self, table: &str) -> CreateBuilder<'_, T> {
        CreateBuilder {
            pool: &self.pool,
            table: table.to_string(),
            _phantom: PhantomData,
        }
    }

    pub fn update<T>(&self, location: (&str, &str)) -> UpdateBuilder<'_, T> {
        UpdateBuilder {
            pool: &self.pool,
            table: location.0.to_string(),
            id: location.1.to_string(),
            _phantom: PhantomData,
        }
    }

    pub async fn select<T>(&self, location: (&str, &str)) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.get_connection().await?;
        conn.get_ref()
            .select((location.0, location.1))
            .await
            .context("Failed to select record")
            .store_err()
    }

    pub fn query(&self, sql: impl Into<String>) -> QueryBuilder<'_> {
        QueryBuilder {
            pool: &self.pool,
            sql: sql.into(),
            bindings: Vec::new(),
        }
    }
}

// Builders route every operation through the pool
pub struct CreateBuilder<'a, T> {
    pool: &'a ConnectionPool,
    table: String,
    _phantom: PhantomData<T>,
}

impl<'a, T> CreateBuilder<'a, T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn content(self, data: T) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.pool.get_connection().await?;
        conn.get_ref()
            .create(self.table.as_str())
            .content(data)
            .await
            .context("Failed to create record")
            .store_err()
    }
}

pub struct UpdateBuilder<'a, T> {
    pool: &'a ConnectionPool,
    table: String,
    id: String,
    _phantom: PhantomData<T>,
}

impl<'a, T> UpdateBuilder<'a, T>
where
    T: Serialize + Send + Sync + 'static,
{
    pub async fn content(self, data: T) -> AppResult<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let conn = self.pool.get_connection().await?;
        conn.get_ref()
            .update((self.table.as_str(), self.id.as_str()))
            .content(data)
            .await
            .context("Failed to update record")
            .store_err()
    }
}

pub struct QueryBuilder<'a> {
    pool: &'a ConnectionPool,
    sql: String,
    bindings: Vec<(String, serde_json::Value)>,
}

impl<'a> QueryBuilder<'a> {
    pub fn bind(mut self, binding: (impl Into<String>, impl Into<serde_json::Value>)) -> Self {
        self.bindings.push((binding.0.into(), binding.1.into()));
        self
    }

    pub async fn r#await(self) -> AppResult<QueryResponse> {
        let conn = self.pool.get_connection().await?;
        let mut query = conn.get_ref().query(&self.sql);

        for (name, value) in self.bindings {
            query = query.bind((name, value));
        }

        let response = query.await.context("Failed to execute query").store_err()?;
        Ok(QueryResponse(response))
    }
}

pub struct QueryResponse(surrealdb::Response);

impl QueryResponse {
    pub async fn take<T>(mut self, index: usize) -> AppResult<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        self.0
            .take(index)
            .context("Failed to extract query results")
            .store_err()
    }
}

/// Typed access to one table, exposing the store contract the services
/// rely on: create, full-document update, find-by-id, find-by-field.
pub struct DbService<T> {
    db: Arc<Database>,
    table_name: String,
    _phantom: PhantomData<T>,
}

impl<T> DbService<T>
where
    T: Clone + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static,
{
    pub fn new(db: Arc<Database>, table_name: impl Into<String>) -> Self {
        Self {
            db,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    // Format error context message
    #[inline]
    fn context_msg(&self, action: &str) -> String {
        format!("Failed to {} {} record", action, self.table_name)
    }

    fn annotate(&self, action: &str, error: AppError) -> AppError {
        if let AppError::StoreUnavailable(err) = error {
            AppError::StoreUnavailable(err.context(self.context_msg(action)))
        } else {
            error
        }
    }

    // Create a new record
    pub async fn create_record(&self, item: T) -> AppResult<Option<T>> {
        self.db
            .create(&self.table_name)
            .content(item)
            .await
            .map_err(|e| self.annotate("create", e))
    }

    /// Replace the whole document. Concurrent writers race; the last
    /// replace wins.
    pub async fn update_record(&self, record_id: &str, updated_data: T) -> AppResult<Option<T>> {
        self.db
            .update((self.table_name.as_str(), record_id))
            .content(updated_data)
            .await
            .map_err(|e| self.annotate("update", e))
    }

    // Get a record by its ID
    pub async fn get_record_by_id(&self, record_id: &str) -> AppResult<Option<T>> {
        self.db
            .select((self.table_name.as_str(), record_id))
            .await
            .map_err(|e| self.annotate("fetch", e))
    }

    // Validate identifier for SQL injection prevention
    fn validate_identifier(&self, identifier: &str) -> AppResult<()> {
        let valid_pattern = regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();

        if !valid_pattern.is_match(identifier) {
            return Err(AppError::ValidationFailed(format!(
                "Invalid identifier '{}': must start with a letter or underscore and contain only alphanumeric characters and underscores",
                identifier
            )));
        }

        Ok(())
    }

    // Get records by a field and value
    pub async fn get_records_by_field<V>(&self, field: &str, value: V) -> AppResult<Vec<T>>
    where
        V: Serialize + Send + Sync + 'static,
    {
        self.validate_identifier(field)?;
        self.validate_identifier(&self.table_name)?;

        let sql = format!("SELECT * FROM {} WHERE {} = $value", self.table_name, field);

        let value_json = serde_json::to_value(value).map_err(|e| {
            AppError::ValidationFailed(format!(
                "Failed to serialize value for field '{}': {}",
                field, e
            ))
        })?;

        let response = self
            .db
            .query(&sql)
            .bind(("value", value_json))
            .r#await()
            .await
            .map_err(|e| self.annotate("query", e))?;

        response
            .take(0)
            .await
            .map_err(|e| self.annotate("query", e))
    }
}
