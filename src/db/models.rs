use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::crypto::hash_password;
use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub username: String,
}

/// A user that has been built from registration input but not yet stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// Hash the plaintext password and assemble the pending record.
    pub fn register(
        username: &str,
        password: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<Self, AppError> {
        Ok(NewUser {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub title: String,
    pub content: String,
    pub username: String,
}

impl NewFeedback {
    pub fn create(title: &str, content: &str, username: &str) -> Self {
        NewFeedback {
            title: title.to_string(),
            content: content.to_string(),
            username: username.to_string(),
        }
    }
}
