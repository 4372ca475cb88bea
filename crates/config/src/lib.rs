use serde::{Deserialize, Serialize};

mod config_loader;
pub use config_loader::*;

/// Configuration is loaded once at process start from an embedded JSON
/// document, with a handful of environment overrides for deployment.
///
/// This module provides the core configuration types and loading functions.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub port: u16,
    pub address: String,
}

impl Server {
    pub fn new(address: String, port: u16) -> Self {
        Self { port, address }
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Vec<u8>,
    pub expiry_hours: u64,
}

impl JwtConfig {
    pub fn new(secret: &[u8], expiry_hours: u64) -> Self {
        Self {
            secret: secret.to_vec(),
            expiry_hours,
        }
    }
}

impl From<&AppConfig> for Server {
    fn from(config: &AppConfig) -> Self {
        Self {
            port: config.server.port,
            address: config.server.host.clone(),
        }
    }
}

impl From<&AppConfig> for JwtConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            secret: config.security.jwt.secret.clone().into_bytes(),
            expiry_hours: config.security.jwt.expiry_hours,
        }
    }
}
