use sqlx::{Pool, Sqlite};

use crate::db::{User, UserRepository};
use crate::error::AppError;

/// True when `acting` may act on resources owned by `target_username`:
/// the acting user is the owner or an admin. Anonymous callers never are.
pub fn permits(acting: Option<&User>, target_username: &str) -> bool {
    match acting {
        Some(user) => user.username == target_username || user.is_admin,
        None => false,
    }
}

/// Resolve a session identity to a stored user.
///
/// A session naming a user that no longer exists is treated as anonymous.
pub async fn acting_user(
    pool: &Pool<Sqlite>,
    acting_username: Option<&str>,
) -> Result<Option<User>, AppError> {
    match acting_username {
        Some(username) => UserRepository::get_by_username(pool, username).await,
        None => Ok(None),
    }
}

/// Like [`acting_user`], failing with `AppError::Unauthorized` for anonymous callers.
pub async fn require_user(
    pool: &Pool<Sqlite>,
    acting_username: Option<&str>,
) -> Result<User, AppError> {
    acting_user(pool, acting_username)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// Resolve the session identity and check it against `target_username`.
pub async fn is_authorized(
    pool: &Pool<Sqlite>,
    acting_username: Option<&str>,
    target_username: &str,
) -> Result<bool, AppError> {
    let acting = acting_user(pool, acting_username).await?;
    Ok(permits(acting.as_ref(), target_username))
}

/// Like [`is_authorized`], failing with `AppError::Unauthorized` instead of returning false.
pub async fn authorize(
    pool: &Pool<Sqlite>,
    acting_username: Option<&str>,
    target_username: &str,
) -> Result<(), AppError> {
    if is_authorized(pool, acting_username, target_username).await? {
        Ok(())
    } else {
        tracing::warn!(
            acting = acting_username.unwrap_or("<anonymous>"),
            target = target_username,
            "Unauthorized access attempt"
        );
        Err(AppError::Unauthorized)
    }
}
