pub mod middleware_handling;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    ConfigError(anyhow::Error),
    StoreUnavailable(anyhow::Error),
    ServerError(anyhow::Error),
    ValidationFailed(String),
    DuplicateEmail(String),
    MissingField(String),
    UserNotFound(String),
    WrongCredentials,
    MissingToken,
    InvalidToken(String),
    ExpiredToken,
    EmptyBody,
    IndexOutOfRange { index: usize, len: usize },
}

impl AppError {
    pub fn duplicate_email(email: &str) -> Self {
        Self::DuplicateEmail(format!("A user with email '{}' already exists.", email))
    }

    pub fn missing_field(field: &str) -> Self {
        Self::MissingField(format!("Required field '{}' is missing or empty.", field))
    }

    pub fn user_not_found(identifier: &str) -> Self {
        Self::UserNotFound(format!("No user found for '{}'.", identifier))
    }

    pub fn token_invalid(reason: impl Into<String>) -> Self {
        Self::InvalidToken(reason.into())
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub fn validation(field: &str, message: &str) -> Self {
        Self::ValidationFailed(format!("Validation failed for '{}': {}", field, message))
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::ServerError(error)
    }
}

// Human-friendly error messages
impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError(e) => write!(f, "Configuration error: {}", e),
            Self::StoreUnavailable(e) => write!(f, "Store error: {}", e),
            Self::ServerError(e) => write!(f, "Server error: {}", e),
            Self::ValidationFailed(msg) => write!(f, "Validation error: {}", msg),
            Self::DuplicateEmail(msg) => write!(f, "Duplicate email: {}", msg),
            Self::MissingField(msg) => write!(f, "Missing field: {}", msg),
            Self::UserNotFound(msg) => write!(f, "User not found: {}", msg),
            Self::WrongCredentials => write!(f, "Wrong email or password"),
            Self::MissingToken => write!(f, "No token supplied"),
            Self::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            Self::ExpiredToken => write!(f, "Token has expired"),
            Self::EmptyBody => write!(f, "No body found in request"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "Index {} is out of range for a list of {} items", index, len)
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Expired and forged tokens are deliberately indistinguishable to
        // the caller; both surface as INVALID_TOKEN.
        let (status, error_message, error_code) = match &self {
            Self::ConfigError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "System configuration error".to_string(),
                "CONFIG_ERROR",
            ),
            Self::StoreUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Store operation failed".to_string(),
                "STORE_UNAVAILABLE",
            ),
            Self::ServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                "SERVER_ERROR",
            ),
            Self::ValidationFailed(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_FAILED")
            }
            Self::DuplicateEmail(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "DUPLICATE_EMAIL")
            }
            Self::MissingField(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "MISSING_FIELD"),
            Self::UserNotFound(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "USER_NOT_FOUND"),
            Self::WrongCredentials => (
                StatusCode::BAD_REQUEST,
                "Wrong email or password".to_string(),
                "WRONG_CREDENTIALS",
            ),
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "No token supplied".to_string(),
                "MISSING_TOKEN",
            ),
            Self::InvalidToken(_) | Self::ExpiredToken => (
                StatusCode::BAD_REQUEST,
                "Invalid token".to_string(),
                "INVALID_TOKEN",
            ),
            Self::EmptyBody => (
                StatusCode::BAD_REQUEST,
                "No body found in request".to_string(),
                "EMPTY_BODY",
            ),
            Self::IndexOutOfRange { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string(), "INDEX_OUT_OF_RANGE")
            }
        };

        let log_message = format!("[{}] {}: {}", error_code, status, self);
        if status.is_server_error() {
            tracing::error!(error_code = error_code, status_code = %status.as_u16(), "{}", log_message);
        } else {
            tracing::warn!(error_code = error_code, status_code = %status.as_u16(), "{}", log_message);
        }

        let body = Json(ErrorResponse {
            status: status.to_string(),
            message: error_message,
            code: error_code.to_string(),
            details: if status == StatusCode::INTERNAL_SERVER_ERROR {
                None // Don't expose internal error details to clients
            } else {
                Some(self.to_string())
            },
        });

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

// Extension trait to wrap anyhow errors with specific context
pub trait AppErrorExt<T> {
    fn config_err(self) -> AppResult<T>;
    fn store_err(self) -> AppResult<T>;
    fn server_err(self) -> AppResult<T>;
}

impl<T, E> AppErrorExt<T> for Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn config_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ConfigError(e.into()))
    }

    fn store_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::StoreUnavailable(e.into()))
    }

    fn server_err(self) -> AppResult<T> {
        self.map_err(|e| AppError::ServerError(e.into()))
    }
}
