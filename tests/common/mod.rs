#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tower::ServiceExt;

use feedback_hub::api::{create_router, AppState};
use feedback_hub::config::Config;
use feedback_hub::db::{self, NewUser, UserRepository};
use feedback_hub::session::{SessionKey, SESSION_COOKIE};
use feedback_hub::templates::Templates;

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

/// Drives the full router in-process and carries the session cookie
/// between requests like a browser would.
pub struct TestApp {
    router: Router,
    pub db: Pool<Sqlite>,
    cookie: Option<String>,
}

fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        secret_key: b"test-secret-key-test-secret-key-test-secret".to_vec(),
        db_max_connections: 1,
        db_min_connections: 1,
        secure_cookies: false,
        admin_usernames: Vec::new(),
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let config = Arc::new(test_config());

        let options = SqliteConnectOptions::from_str(&config.database_url)
            .unwrap()
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap();
        db::MIGRATOR.run(&pool).await.unwrap();

        let state = AppState {
            db: pool.clone(),
            templates: Arc::new(Templates::load().unwrap()),
            session_key: SessionKey::new(&config.secret_key, config.secure_cookies).unwrap(),
            config: config.clone(),
        };

        TestApp {
            router: create_router(state),
            db: pool,
            cookie: None,
        }
    }

    /// A second browser sharing the same server and database.
    pub fn new_client(&self) -> Self {
        TestApp {
            router: self.router.clone(),
            db: self.db.clone(),
            cookie: None,
        }
    }

    pub fn set_session_cookie(&mut self, value: &str) {
        self.cookie = Some(format!("{}={}", SESSION_COOKIE, value));
    }

    pub fn has_session(&self) -> bool {
        self.cookie.is_some()
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let request = self
            .request("POST", uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    pub async fn register(&mut self, username: &str, password: &str) -> TestResponse {
        let email = format!("{}@example.com", username);
        self.post(
            "/register",
            &[
                ("username", username),
                ("password", password),
                ("confirm", password),
                ("email", &email),
                ("first_name", "Test"),
                ("last_name", "User"),
            ],
        )
        .await
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        self.post("/login", &[("username", username), ("password", password)])
            .await
    }

    pub async fn logout(&mut self) -> TestResponse {
        self.get("/logout").await
    }

    /// Insert an admin directly, bypassing the HTTP surface.
    pub async fn create_admin(&self, username: &str, password: &str) {
        let user = NewUser::register(
            username,
            password,
            &format!("{}@example.com", username),
            "Admin",
            "User",
        )
        .unwrap();
        UserRepository::insert(&self.db, &user).await.unwrap();
        UserRepository::set_admin(&self.db, username, true).await.unwrap();
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(SET_COOKIE) {
            let value = value.to_str().unwrap();
            let pair = value.split(';').next().unwrap_or_default().trim();
            if !pair.starts_with(&format!("{}=", SESSION_COOKIE)) {
                continue;
            }
            if value.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}
