use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber, layer::SubscriberExt};

use app_config::{AppConfig, Argon2Config, JwtConfig, Server};
use app_database::{db_connect::initialize_db, service::DbService};
use app_error::{AppError, AppErrorExt};
use app_models::User;
use micro_todo::{
    routes,
    service::{AccountService, ItemService},
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // .env is honored for local development
    dotenv::dotenv().ok();

    // Configuration is resolved once; nothing re-reads the environment
    // after this point
    let config = AppConfig::load()?;

    let _guard = sentry::init((
        config.monitoring.sentry.dsn.clone(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.monitoring.sentry.environment.clone().into()),
            ..Default::default()
        },
    ));

    // Initialize the logger
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.monitoring.logging.level.clone()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    let subscriber = subscriber.with(sentry_tracing::layer());
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
        .server_err()?;

    info!("Starting application at {}", chrono::Utc::now());

    // Initialize the store connection
    let db = initialize_db(&config.database).await?;
    let user_db = Arc::new(DbService::<User>::new(db, "users"));

    let jwt_config = JwtConfig::from(&config);
    let argon2: Argon2Config = config.security.password.argon2.clone();

    let accounts = Arc::new(AccountService::new(
        &jwt_config,
        argon2,
        Arc::clone(&user_db),
    ));
    let items = Arc::new(ItemService::new(user_db));

    // Configure application routes
    let app = routes::create_routes(&config, accounts, items);

    // Bind server to address and start it
    let server = Server::from(&config);
    let address = format!("{}:{}", server.address, server.port);
    let listener = TcpListener::bind(&address)
        .await
        .context(format!("Failed to bind to address: {}", address))
        .server_err()?;

    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .await
        .context("Server error")
        .server_err()?;

    Ok(())
}
