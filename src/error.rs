use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found")]
    NotFound,

    /// A unique column (`username` or `email`) already holds the submitted value.
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration failed: {}", err))
    }
}

/// Marker left on 401/404 responses so the error-page middleware can swap in
/// the rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPage {
    Unauthorized,
    NotFound,
}

impl ErrorPage {
    pub fn template(self) -> &'static str {
        match self {
            ErrorPage::Unauthorized => "401.html",
            ErrorPage::NotFound => "404.html",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorPage::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorPage::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let page = match self {
            AppError::Unauthorized => ErrorPage::Unauthorized,
            AppError::NotFound => ErrorPage::NotFound,
            other => {
                tracing::error!("❌ Request failed: {}", other);
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
            }
        };

        let mut response = (page.status(), page.status().as_str().to_string()).into_response();
        response.extensions_mut().insert(page);
        response
    }
}
