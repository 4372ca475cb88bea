use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};
use tracing::{debug, info, warn};

use app_error::{AppError, AppResult};

/// Complete application configuration loaded from JSON file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub environment: String,
    pub database: SurrealDbConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SurrealDbConfig {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
    pub pool: DbPoolConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DbPoolConfig {
    pub size: usize,
    pub connection_timeout: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,
    pub body_limit: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    pub jwt: JwtSettings,
    pub password: PasswordConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub expiry_hours: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PasswordConfig {
    pub argon2: Argon2Config,
}

/// Cost parameters for the adaptive password hash. Higher values make
/// hashing slower and brute force more expensive.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Argon2Config {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    pub sentry: SentryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SentryConfig {
    pub dsn: String,
    pub environment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database: SurrealDbConfig {
                endpoint: "ws://localhost:8000".to_string(),
                username: "root".to_string(),
                password: "root".to_string(),
                namespace: "todo".to_string(),
                database: "todo".to_string(),
                pool: DbPoolConfig {
                    size: 8,
                    connection_timeout: 5,
                },
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                request_timeout: 30,
                body_limit: 1024 * 1024,
            },
            security: SecurityConfig {
                jwt: JwtSettings {
                    secret: "change-me-in-production".to_string(),
                    expiry_hours: 24,
                },
                password: PasswordConfig {
                    argon2: Argon2Config {
                        memory: 19_456,
                        iterations: 2,
                        parallelism: 1,
                    },
                },
            },
            monitoring: MonitoringConfig {
                sentry: SentryConfig {
                    dsn: String::new(),
                    environment: "development".to_string(),
                },
                logging: LoggingConfig {
                    level: "info".to_string(),
                },
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        debug!("Configuration loaded from file");
        Ok(config)
    }

    /// Load configuration from the embedded default document, then apply
    /// environment overrides and validate.
    pub fn load() -> AppResult<Self> {
        let config_content =
            std::str::from_utf8(include_bytes!("../res/app-config.json")).expect("Invalid UTF-8");

        let mut config = match serde_json::from_str::<AppConfig>(config_content) {
            Ok(conf) => {
                info!("Loaded configuration for environment: {:?}", conf.environment);
                conf
            }
            Err(e) => {
                warn!(
                    "Failed to load config file: {}. Using default configuration.",
                    e
                );
                Self::default()
            }
        };

        config.override_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply the deployment-level environment overrides the service
    /// historically honored.
    fn override_from_env(&mut self) {
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.security.jwt.secret = secret;
        }

        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring unparseable PORT value: {}", port),
            }
        }

        if let Ok(endpoint) = env::var("SURREALDB_ENDPOINT") {
            self.database.endpoint = endpoint;
        }

        if let Ok(username) = env::var("SURREALDB_USERNAME") {
            self.database.username = username;
        }

        if let Ok(password) = env::var("SURREALDB_PASSWORD") {
            self.database.password = password;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = Vec::new();
        let is_production = self.environment == "production";

        // Database validation
        if self.database.endpoint.trim().is_empty() {
            errors.push("Database endpoint cannot be empty".to_string());
        } else if is_production
            && !self.database.endpoint.starts_with("wss://")
            && !self.database.endpoint.contains("memory")
        {
            errors.push("Production should use a secure 'wss://' database connection".to_string());
        }

        if self.database.namespace.trim().is_empty() {
            errors.push("Database namespace cannot be empty".to_string());
        }

        if self.database.database.trim().is_empty() {
            errors.push("Database name cannot be empty".to_string());
        }

        if self.database.pool.size == 0 {
            errors.push("Database pool size must be greater than 0".to_string());
        }

        if is_production {
            if self.database.username == "root" {
                errors.push("Using default 'root' username in production is insecure".to_string());
            }

            if self.database.password == "root" {
                errors.push("Using default 'root' password in production is insecure".to_string());
            }
        }

        // Server validation
        if self.server.host.trim().is_empty() {
            errors.push("Server host cannot be empty".to_string());
        }

        if self.server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }

        // Security validation
        if self.security.jwt.secret.trim().is_empty() {
            errors.push("JWT secret cannot be empty".to_string());
        }

        if is_production
            && (self.security.jwt.secret.len() < 32
                || self.security.jwt.secret == "change-me-in-production")
        {
            errors.push("JWT secret is not secure for production use".to_string());
        }

        if self.security.jwt.expiry_hours == 0 {
            errors.push("JWT expiry must be at least one hour".to_string());
        }

        if self.security.password.argon2.iterations == 0
            || self.security.password.argon2.parallelism == 0
        {
            errors.push("Argon2 cost parameters must be greater than 0".to_string());
        }

        if !errors.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid configuration: {}",
                errors.join(", ")
            )));
        }
        Ok(())
    }
}
