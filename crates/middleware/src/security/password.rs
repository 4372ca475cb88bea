use app_config::Argon2Config;
use app_error::{AppError, AppResult};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, error};

fn hasher(config: &Argon2Config) -> AppResult<Argon2<'static>> {
    let params = Params::new(config.memory, config.iterations, config.parallelism, None)
        .map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid argon2 cost parameters: {}", e))
        })?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a password using Argon2id with the configured cost. The PHC
/// string output embeds the salt and cost parameters, so verification
/// needs no configuration.
pub fn hash_password(password: &str, config: &Argon2Config) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = hasher(config)?;

    debug!("Hashing password");
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            AppError::ServerError(anyhow::anyhow!("Failed to hash password: {}", e))
        })?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash).map_err(|e| {
        error!("Invalid password hash: {}", e);
        AppError::ServerError(anyhow::anyhow!("Invalid password hash: {}", e))
    })?;

    let is_valid = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    debug!("Password verification result: {}", is_valid);
    Ok(is_valid)
}
