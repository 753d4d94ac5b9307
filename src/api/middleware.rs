use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tera::Context;

use crate::api::state::AppState;
use crate::error::ErrorPage;
use crate::session::Session;

/// Replace the bodies of 401/404 responses with the rendered error pages.
pub async fn error_pages(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    let Some(page) = response.extensions().get::<ErrorPage>().copied() else {
        return response;
    };

    let mut context = Context::new();
    context.insert("current_user", &session.username());
    context.insert("flashes", &Vec::<String>::new());

    match state.templates.render(page.template(), &context) {
        Ok(html) => (page.status(), html).into_response(),
        Err(e) => {
            tracing::error!("❌ Failed to render {}: {}", page.template(), e);
            response
        }
    }
}
