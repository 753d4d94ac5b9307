use rand::RngCore;

use crate::error::AppError;

/// Minimum length of `SECRET_KEY`, in bytes.
pub const MIN_SECRET_KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub secret_key: Vec<u8>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub secure_cookies: bool,
    pub admin_usernames: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = match std::env::var("SECRET_KEY") {
            Ok(key) if key.len() >= MIN_SECRET_KEY_LEN => key.into_bytes(),
            Ok(_) => {
                return Err(AppError::Config(format!(
                    "SECRET_KEY must be at least {} bytes",
                    MIN_SECRET_KEY_LEN
                )))
            }
            Err(_) => {
                tracing::warn!("⚠️  SECRET_KEY not set, sessions will not survive a restart");
                random_secret_key()
            }
        };

        Ok(Config {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://feedback_hub.db".to_string()),
            secret_key,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", e)))?,
            db_min_connections: std::env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid DB_MIN_CONNECTIONS: {}", e)))?,
            secure_cookies: std::env::var("SECURE_COOKIES")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SECURE_COOKIES: {}", e)))?,
            admin_usernames: parse_list(&std::env::var("ADMIN_USERNAMES").unwrap_or_default()),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn random_secret_key() -> Vec<u8> {
    let mut key = vec![0u8; 64];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
