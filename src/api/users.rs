use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tera::Context;

use crate::api::state::AppState;
use crate::api::{render_page, user_path};
use crate::authz::{acting_user, authorize};
use crate::db::{FeedbackRepository, NewUser, UserRepository};
use crate::error::AppError;
use crate::forms::{Form as _, FormErrors, LoginForm, RegisterForm, LOGIN_RULES, REGISTER_RULES};
use crate::session::Session;

/// Shown for both unknown usernames and wrong passwords.
const LOGIN_FAILED: &str = "Invalid username or password.";

fn duplicate_message(field: &str) -> &'static str {
    match field {
        "email" => "Email is already registered.",
        _ => "Username is already taken.",
    }
}

fn render_register(
    state: &AppState,
    session: Session,
    form: &RegisterForm,
    errors: &FormErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    render_page(state, session, "register.html", context)
}

fn render_login(
    state: &AppState,
    session: Session,
    form: &LoginForm,
    errors: &FormErrors,
) -> Result<Response, AppError> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    render_page(state, session, "login.html", context)
}

/// Where a caller who is already logged in should be sent instead of the
/// register form. A session naming a deleted user is logged out.
async fn profile_redirect(state: &AppState, session: &mut Session) -> Result<Option<Redirect>, AppError> {
    if session.username().is_none() {
        return Ok(None);
    }

    match acting_user(&state.db, session.username()).await? {
        Some(user) => Ok(Some(Redirect::to(&user_path(&user.username)))),
        None => {
            tracing::info!(
                username = session.username().unwrap_or_default(),
                "Dropping session for deleted user"
            );
            session.clear();
            Ok(None)
        }
    }
}

/// GET /
pub async fn index() -> Redirect {
    Redirect::to("/register")
}

/// GET /register
pub async fn register_form(
    State(state): State<AppState>,
    mut session: Session,
) -> Result<Response, AppError> {
    if let Some(redirect) = profile_redirect(&state, &mut session).await? {
        return Ok(redirect.into_response());
    }

    render_register(
        &state,
        session,
        &RegisterForm::default(),
        &FormErrors::for_rules(REGISTER_RULES),
    )
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = profile_redirect(&state, &mut session).await? {
        return Ok(redirect.into_response());
    }

    let mut errors = form.validate();
    if !errors.is_empty() {
        return render_register(&state, session, &form, &errors);
    }

    let new_user = NewUser::register(
        &form.username,
        &form.password,
        &form.email,
        &form.first_name,
        &form.last_name,
    )?;

    let user = match UserRepository::insert(&state.db, &new_user).await {
        Ok(user) => user,
        Err(AppError::Duplicate(field)) => {
            tracing::info!(username = %form.username, field, "Registration rejected: duplicate value");
            errors.add(field, duplicate_message(field));
            return render_register(&state, session, &form, &errors);
        }
        Err(e) => return Err(e),
    };

    tracing::info!(username = %user.username, "User registered");

    session.login(&user.username);
    session.flash(format!("{} has registered", user.username));

    Ok((session, Redirect::to(&user_path(&user.username))).into_response())
}

/// GET /login
pub async fn login_form(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    render_login(
        &state,
        session,
        &LoginForm::default(),
        &FormErrors::for_rules(LOGIN_RULES),
    )
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    mut session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut errors = form.validate();
    if !errors.is_empty() {
        return render_login(&state, session, &form, &errors);
    }

    let Some(user) = UserRepository::authenticate(&state.db, &form.username, &form.password).await? else {
        tracing::warn!(username = %form.username, "Failed login");
        errors.add("username", LOGIN_FAILED);
        return render_login(&state, session, &form, &errors);
    };

    tracing::info!(username = %user.username, "User logged in");

    session.login(&user.username);
    session.flash(format!("{} has logged in", user.username));

    Ok((session, Redirect::to(&user_path(&user.username))).into_response())
}

/// GET /logout
pub async fn logout(mut session: Session) -> Response {
    if let Some(username) = session.username() {
        tracing::info!(username, "User logged out");
    }
    session.clear();

    (session, Redirect::to("/")).into_response()
}

/// GET /users/{username}
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    authorize(&state.db, session.username(), &username).await?;

    let user = UserRepository::get_by_username(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;
    let feedbacks = FeedbackRepository::list_for_user(&state.db, &user.username).await?;

    let mut context = Context::new();
    context.insert("user", &user);
    context.insert("feedbacks", &feedbacks);
    render_page(&state, session, "user_details.html", context)
}

/// POST /users/{username}/delete
pub async fn delete(
    State(state): State<AppState>,
    mut session: Session,
    Path(username): Path<String>,
) -> Result<Response, AppError> {
    authorize(&state.db, session.username(), &username).await?;

    if !UserRepository::delete(&state.db, &username).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(
        username = %username,
        deleted_by = session.username().unwrap_or_default(),
        "User deleted"
    );

    if session.username() == Some(username.as_str()) {
        session.clear();
    }
    session.flash(format!("{} has been deleted", username));

    Ok((session, Redirect::to("/")).into_response())
}
