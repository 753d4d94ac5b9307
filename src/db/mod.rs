pub mod models;
pub mod users;
pub mod feedback;

pub use models::{Feedback, NewFeedback, NewUser, User};
pub use users::UserRepository;
pub use feedback::FeedbackRepository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::error::AppError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the connection pool described by `config` and bring the schema up to date.
pub async fn connect(config: &Config) -> Result<Pool<Sqlite>, AppError> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

/// Returns the unique column an insert collided with, if `err` is a
/// uniqueness violation (SQLite 2067/1555, Postgres 23505, MySQL 1062).
pub fn unique_violation_column(err: &sqlx::Error) -> Option<&'static str> {
    let db_err = err.as_database_error()?;

    let code_matches = db_err
        .code()
        .map(|c| matches!(&*c, "2067" | "1555" | "23505" | "1062"))
        .unwrap_or(false);

    if !(db_err.is_unique_violation() || code_matches) {
        return None;
    }

    if db_err.message().contains("email") {
        Some("email")
    } else {
        Some("username")
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> Pool<Sqlite> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    // A single long-lived connection keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    MIGRATOR.run(&pool).await.unwrap();
    pool
}
