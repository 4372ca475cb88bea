use crate::{
    handlers,
    service::{AccountService, ItemService},
};
use std::{sync::Arc, time::Duration};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use axum::{
    Router,
    extract::Extension,
    routing::{get, post, put},
};

use app_config::AppConfig;
use app_error::middleware_handling::error_handling_middleware;
use app_middleware::api_middleware::{
    logging_middleware, require_auth, security_headers_middleware,
};

pub fn create_routes(
    config: &AppConfig,
    accounts: Arc<AccountService>,
    items: Arc<ItemService>,
) -> Router {
    let jwt_service = accounts.get_jwt_service();

    // The service has always been open to any origin
    let cors = CorsLayer::permissive();

    // Define global middleware stack
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout,
        )))
        .layer(cors);

    // Item routes sit behind the token gate; signup and login do not
    let protected = Router::new()
        .route("/api/items", get(handlers::get_items))
        .route("/api/item", post(handlers::add_item))
        .route(
            "/api/item/{index}",
            put(handlers::toggle_item).delete(handlers::remove_item),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_service,
            require_auth,
        ));

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/signup", post(handlers::signup))
        .route("/api/login", post(handlers::login))
        .merge(protected);

    // Add Extensions
    let app = app
        .layer(Extension(Arc::clone(&accounts)))
        .layer(Extension(Arc::clone(&items)));

    // Apply middleware in order
    let app = app
        .layer(axum::middleware::from_fn(error_handling_middleware))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit));

    let app = app
        .layer(axum::middleware::from_fn(logging_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(CatchPanicLayer::new());

    // Apply global middleware stack
    app.layer(middleware_stack)
}
