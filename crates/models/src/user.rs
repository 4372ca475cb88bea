use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;
use uuid::Uuid;

use crate::item::Item;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(default = "User::generate_id")]
    pub id: Thing,
    pub email: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    // Helper to generate a new ID
    fn generate_id() -> Thing {
        Thing::from(("users".to_string(), Uuid::new_v4().to_string()))
    }

    /// Create a new user; registration always starts with an empty list.
    pub fn new(email: String, user_name: String, password: String) -> Self {
        let now = Utc::now();
        Self {
            id: Self::generate_id(),
            email,
            user_name,
            password,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The record id without table prefix or ⟨⟩ escaping, usable as a
    /// token subject and for store lookups.
    pub fn record_key(&self) -> String {
        self.id
            .id
            .to_string()
            .trim_start_matches('⟨')
            .trim_end_matches('⟩')
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupInput {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsResponse {
    pub items: Vec<Item>,
    pub name: String,
}
