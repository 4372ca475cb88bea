use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

use app_config::{Argon2Config, JwtConfig};
use app_database::service::DbService;
use app_error::{AppError, AppResult};
use app_middleware::{JwtService, security::password, validation};
use app_models::{Item, LoginInput, SignupInput, User};

/// Registration and login, composing the password hasher, the token
/// service and the user store.
pub struct AccountService {
    jwt_service: Arc<JwtService>,
    argon2: Argon2Config,
    user_db: Arc<DbService<User>>,
}

impl AccountService {
    pub fn new(
        jwt_config: &JwtConfig,
        argon2: Argon2Config,
        user_db: Arc<DbService<User>>,
    ) -> Self {
        Self {
            jwt_service: Arc::new(JwtService::new(&jwt_config.secret, jwt_config.expiry_hours)),
            argon2,
            user_db,
        }
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt_service)
    }

    /// Register a new account and return a token for it.
    pub async fn signup(&self, input: SignupInput) -> AppResult<String> {
        let email = validation::sanitize_string(&input.email);
        let user_name = validation::sanitize_string(&input.user_name);

        // The taken-email answer wins over missing-field complaints
        let existing = self
            .user_db
            .get_records_by_field("email", email.clone())
            .await
            .map_err(|e| {
                error!("Store error when checking for existing email: {}", e);
                e
            })?;

        if !existing.is_empty() {
            return Err(AppError::duplicate_email(&email));
        }

        if user_name.is_empty() {
            return Err(AppError::missing_field("userName"));
        }

        if input.password.is_empty() {
            return Err(AppError::missing_field("password"));
        }

        let hashed_password = password::hash_password(&input.password, &self.argon2)?;

        let user = User::new(email, user_name, hashed_password);
        validation::validate_user_record(&user.email, &user.user_name, &user.password)?;

        info!("Storing new user in store: {}", user.email);
        let stored_user = match self.user_db.create_record(user.clone()).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                error!("Store did not return the stored user");
                user // Fall back to the record we assembled
            }
            Err(e) => {
                error!("Failed to store user: {}", e);
                return Err(e);
            }
        };

        self.jwt_service.generate_token(&stored_user.record_key())
    }

    /// Authenticate an existing account and return a fresh token.
    /// Causes no store writes.
    pub async fn login(&self, input: LoginInput) -> AppResult<String> {
        let email = validation::sanitize_string(&input.email);

        let users = self
            .user_db
            .get_records_by_field("email", email.clone())
            .await
            .map_err(|e| {
                error!("Store error when fetching user for login: {}", e);
                e
            })?;

        let user = users
            .first()
            .ok_or_else(|| AppError::user_not_found(&email))?;

        let is_valid = password::verify_password(&input.password, &user.password)?;
        if !is_valid {
            return Err(AppError::WrongCredentials);
        }

        self.jwt_service.generate_token(&user.record_key())
    }
}

/// Mutation of the authenticated user's list. Every operation is a
/// read-modify-write of the whole user document with no version check;
/// two concurrent mutations race and the last write wins, which mirrors
/// the store's own per-document replace semantics.
pub struct ItemService {
    user_db: Arc<DbService<User>>,
}

impl ItemService {
    pub fn new(user_db: Arc<DbService<User>>) -> Self {
        Self { user_db }
    }

    // A guard-verified token should always resolve; a miss here is an
    // internal consistency failure.
    async fn load_user(&self, subject: &str) -> AppResult<User> {
        let key = subject.trim_start_matches('⟨').trim_end_matches('⟩');

        self.user_db
            .get_record_by_id(key)
            .await
            .map_err(|e| {
                error!("Store error when fetching user by ID: {}", e);
                e
            })?
            .ok_or_else(|| AppError::user_not_found(key))
    }

    async fn persist(&self, mut user: User) -> AppResult<Vec<Item>> {
        user.updated_at = Utc::now();
        let key = user.record_key();

        let stored = self.user_db.update_record(&key, user.clone()).await?;
        Ok(stored.unwrap_or(user).items)
    }

    /// Read-only projection of the user's items and display name.
    pub async fn list(&self, subject: &str) -> AppResult<(Vec<Item>, String)> {
        let user = self.load_user(subject).await?;
        Ok((user.items, user.user_name))
    }

    /// Append a client-supplied item to the end of the list.
    pub async fn append(&self, subject: &str, payload: Option<Value>) -> AppResult<Vec<Item>> {
        let item = payload
            .and_then(Item::from_value)
            .ok_or(AppError::EmptyBody)?;

        let mut user = self.load_user(subject).await?;
        user.items.push(item);
        self.persist(user).await
    }

    /// Flip the `done` flag of the item at `index`.
    pub async fn toggle_done(&self, subject: &str, index: usize) -> AppResult<Vec<Item>> {
        let mut user = self.load_user(subject).await?;
        let len = user.items.len();

        let item = user
            .items
            .get_mut(index)
            .ok_or_else(|| AppError::index_out_of_range(index, len))?;
        item.toggle_done();

        self.persist(user).await
    }

    /// Remove the item at `index`; later items shift down by one.
    pub async fn remove(&self, subject: &str, index: usize) -> AppResult<Vec<Item>> {
        let mut user = self.load_user(subject).await?;

        if index >= user.items.len() {
            return Err(AppError::index_out_of_range(index, user.items.len()));
        }
        user.items.remove(index);

        self.persist(user).await
    }
}
