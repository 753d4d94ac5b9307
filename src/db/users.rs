use sqlx::{Pool, Sqlite};
use crate::crypto::verify_password;
use crate::db::models::{NewUser, User};
use crate::db::unique_violation_column;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    /// Store a registered user.
    ///
    /// Fails with `AppError::Duplicate` when the username or email is taken;
    /// nothing is written in that case.
    pub async fn insert(
        pool: &Pool<Sqlite>,
        new_user: &NewUser,
    ) -> Result<User, AppError> {
        let result = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, password_hash, email, first_name, last_name, is_admin)
VALUES (?, ?, ?, ?, ?, 0)
RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .fetch_one(pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(err) => match unique_violation_column(&err) {
                Some(column) => Err(AppError::Duplicate(column)),
                None => Err(err.into()),
            },
        }
    }

    pub async fn get_by_username(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ?"
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Look up `username` and check `password` against its stored digest.
    ///
    /// Unknown users and wrong passwords both come back as `None`.
    pub async fn authenticate(
        pool: &Pool<Sqlite>,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AppError> {
        let user = Self::get_by_username(pool, username).await?;

        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    /// Delete a user together with all of their feedback.
    ///
    /// Returns `false` if no such user existed.
    pub async fn delete(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<bool, AppError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM feedbacks WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }

    pub async fn set_admin(
        pool: &Pool<Sqlite>,
        username: &str,
        is_admin: bool,
    ) -> Result<bool, AppError> {
        let updated = sqlx::query("UPDATE users SET is_admin = ? WHERE username = ?")
            .bind(is_admin)
            .bind(username)
            .execute(pool)
            .await?
            .rows_affected();

        Ok(updated > 0)
    }
}
