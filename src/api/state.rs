use std::sync::Arc;
use axum::extract::FromRef;
use sqlx::{Pool, Sqlite};
use crate::config::Config;
use crate::session::SessionKey;
use crate::templates::Templates;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub templates: Arc<Templates>,
    pub session_key: SessionKey,
    pub config: Arc<Config>,
}

impl FromRef<AppState> for SessionKey {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}
