use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::JwtService;
use app_error::AppError;

/// Header the client supplies its token in.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Authentication gate for the protected routes. Rejects requests without
/// a token (401) or with a token that fails verification (400); whether
/// the token was forged or merely expired is not revealed to the caller.
/// On success the verified claims are placed in request extensions for
/// the handler.
///
/// This performs no store access; a subject that no longer resolves is
/// the handler's problem.
pub async fn require_auth(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .ok_or(AppError::MissingToken)?;

    let token = header
        .to_str()
        .map_err(|_| AppError::token_invalid("token header is not valid UTF-8"))?;

    let claims = jwt_service.validate_token(token).map_err(|e| {
        warn!("Token validation failed: {}", e);
        // Collapse expiry and signature failures into one answer
        AppError::token_invalid("token verification failed")
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// Security headers middleware
pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));

    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

// Logging middleware with performance tracking
pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    use std::time::Instant;

    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    info!(
        method = %method,
        path = %path,
        "Request started"
    );

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    if status < 400 {
        info!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed"
        );
    } else if status < 500 {
        warn!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    }

    response
}
