pub mod feedback;
pub mod middleware;
pub mod state;
pub mod users;

pub use state::AppState;

use axum::{
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tera::Context;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::session::Session;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(users::index))
        .route("/register", get(users::register_form).post(users::register))
        .route("/login", get(users::login_form).post(users::login))
        .route("/logout", get(users::logout))
        .route("/users/{username}", get(users::show))
        .route("/users/{username}/delete", post(users::delete))
        .route(
            "/users/{username}/feedback/add",
            get(feedback::add_form).post(feedback::add),
        )
        .route(
            "/feedback/{id}/update",
            get(feedback::update_form).post(feedback::update),
        )
        .route("/feedback/{id}/delete", post(feedback::delete))
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::error_pages,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Render a page, handing it the current user and any pending flash messages.
pub(crate) fn render_page(
    state: &AppState,
    mut session: Session,
    template: &str,
    mut context: Context,
) -> Result<Response, AppError> {
    context.insert("current_user", &session.username());
    context.insert("flashes", &session.take_flashes());

    let html = state.templates.render(template, &context)?;
    Ok((session, html).into_response())
}

/// Profile URL for `username`, safe to use as a `Location` header.
pub(crate) fn user_path(username: &str) -> String {
    format!("/users/{}", urlencoding::encode(username))
}
