use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use sqlx::{Pool, Sqlite};
use tera::Context;

use crate::api::state::AppState;
use crate::api::{render_page, user_path};
use crate::authz::{authorize, permits, require_user};
use crate::db::{Feedback, FeedbackRepository, NewFeedback, UserRepository};
use crate::error::AppError;
use crate::forms::{FeedbackForm, Form as _, FormErrors, FEEDBACK_RULES};
use crate::session::Session;

/// Parse a feedback id from the path and load the row. Ids that are not
/// integers are treated like unknown ones.
async fn load_feedback(pool: &Pool<Sqlite>, raw_id: &str) -> Result<Feedback, AppError> {
    let id: i64 = raw_id.parse().map_err(|_| AppError::NotFound)?;

    FeedbackRepository::get_by_id(pool, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Load a feedback the session user may act on. Anonymous callers are
/// rejected before the id is looked up, so they cannot tell which ids exist.
async fn load_owned_feedback(state: &AppState, session: &Session, raw_id: &str) -> Result<Feedback, AppError> {
    let acting = require_user(&state.db, session.username()).await?;
    let feedback = load_feedback(&state.db, raw_id).await?;

    if !permits(Some(&acting), &feedback.username) {
        tracing::warn!(
            acting = %acting.username,
            target = %feedback.username,
            id = feedback.id,
            "Unauthorized feedback access attempt"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(feedback)
}

/// Authorize against `username` and make sure that user exists.
async fn authorize_owner(state: &AppState, session: &Session, username: &str) -> Result<(), AppError> {
    authorize(&state.db, session.username(), username).await?;

    UserRepository::get_by_username(&state.db, username)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(())
}

fn render_add(
    state: &AppState,
    session: Session,
    username: &str,
    form: &FeedbackForm,
    errors: &FormErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("username", username);
    context.insert("form", form);
    context.insert("errors", errors);
    render_page(state, session, "add_feedback.html", context)
}

fn render_update(
    state: &AppState,
    session: Session,
    feedback: &Feedback,
    form: &FeedbackForm,
    errors: &FormErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("feedback", feedback);
    context.insert("form", form);
    context.insert("errors", errors);
    render_page(state, session, "update_feedback.html", context)
}

/// GET /users/{username}/feedback/add
pub async fn add_form(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    authorize_owner(&state, &session, &username).await?;

    render_add(
        &state,
        session,
        &username,
        &FeedbackForm::default(),
        &FormErrors::for_rules(FEEDBACK_RULES),
    )
}

/// POST /users/{username}/feedback/add
pub async fn add(
    State(state): State<AppState>,
    mut session: Session,
    Path(username): Path<String>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    authorize_owner(&state, &session, &username).await?;

    let errors = form.validate();
    if !errors.is_empty() {
        return render_add(&state, session, &username, &form, &errors);
    }

    let feedback = FeedbackRepository::insert(
        &state.db,
        &NewFeedback::create(&form.title, &form.content, &username),
    )
    .await?;

    tracing::debug!(id = feedback.id, owner = %username, "Feedback added");
    session.flash("You added one feedback!");

    Ok((session, Redirect::to(&user_path(&username))).into_response())
}

/// GET /feedback/{id}/update
pub async fn update_form(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let feedback = load_owned_feedback(&state, &session, &id).await?;

    render_update(
        &state,
        session,
        &feedback,
        &FeedbackForm::from_feedback(&feedback),
        &FormErrors::for_rules(FEEDBACK_RULES),
    )
}

/// POST /feedback/{id}/update
pub async fn update(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<String>,
    Form(form): Form<FeedbackForm>,
) -> Result<Response, AppError> {
    let feedback = load_owned_feedback(&state, &session, &id).await?;

    let errors = form.validate();
    if !errors.is_empty() {
        return render_update(&state, session, &feedback, &form, &errors);
    }

    let updated = FeedbackRepository::update(&state.db, feedback.id, &form.title, &form.content)
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::debug!(id = updated.id, owner = %updated.username, "Feedback updated");
    session.flash("You updated feedback detail!");

    Ok((session, Redirect::to(&user_path(&updated.username))).into_response())
}

/// POST /feedback/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    mut session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let feedback = load_owned_feedback(&state, &session, &id).await?;

    if !FeedbackRepository::delete(&state.db, feedback.id).await? {
        return Err(AppError::NotFound);
    }

    tracing::debug!(id = feedback.id, owner = %feedback.username, "Feedback deleted");
    session.flash("You deleted one feedback!");

    Ok((session, Redirect::to(&user_path(&feedback.username))).into_response())
}
