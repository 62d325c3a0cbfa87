//! Login, signup and logout

use axum::{
    extract::State,
    response::Response,
    Form,
};
use manager_common::db::{users, users::LoginOutcome, DbFailure};
use tera::Context;
use tracing::{error, info, warn};

use crate::api::found;
use crate::error::AppResult;
use crate::forms::{FieldErrors, LoginForm, SignupForm};
use crate::render::render;
use crate::session::Session;
use crate::AppState;

fn login_page(state: &AppState, session: &Session, form: &LoginForm, errors: &FieldErrors) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    render(&state.templates, session, "login.html", context)
}

fn signup_page(state: &AppState, session: &Session, form: &SignupForm, errors: &FieldErrors) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    render(&state.templates, session, "signup.html", context)
}

/// GET /
pub async fn show_login(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    login_page(&state, &session, &LoginForm::default(), &FieldErrors::default())
}

/// POST /
pub async fn login(State(state): State<AppState>, session: Session, Form(form): Form<LoginForm>) -> AppResult<Response> {
    let (username, password) = match form.validate() {
        Ok(credentials) => credentials,
        Err(errors) => return login_page(&state, &session, &form, &errors),
    };

    match users::authenticate(&state.db, &username, &password).await {
        Ok(LoginOutcome::Success(user)) => {
            info!(username = %user.username, "User logged in");
            session.set_username(user.username);
            Ok(found("/app"))
        }
        Ok(outcome) => {
            warn!(username = %username, "Login failed: {}", outcome.message());
            session.flash("Invalid username or password");
            login_page(&state, &session, &form, &FieldErrors::default())
        }
        Err(e) => {
            error!("Login query failed: {}", e);
            session.flash(DbFailure::of(&e).message("Database Error: could not log in"));
            login_page(&state, &session, &form, &FieldErrors::default())
        }
    }
}

/// GET /signup
pub async fn show_signup(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    signup_page(&state, &session, &SignupForm::default(), &FieldErrors::default())
}

/// POST /signup
pub async fn signup(State(state): State<AppState>, session: Session, Form(form): Form<SignupForm>) -> AppResult<Response> {
    let signup = match form.validate() {
        Ok(signup) => signup,
        Err(errors) => return signup_page(&state, &session, &form, &errors),
    };

    let created = match users::username_exists(&state.db, &signup.username).await {
        Ok(true) => {
            session.flash("Username already exists. Please choose a different one.");
            return signup_page(&state, &session, &form, &FieldErrors::default());
        }
        Ok(false) => users::create_user(&state.db, &signup.name, &signup.username, &signup.password).await,
        Err(e) => Err(e),
    };

    match created {
        Ok(user) => {
            info!(username = %user.username, "Account created");
            session.flash("Account created successfully! Please log in.");
            Ok(found("/app"))
        }
        Err(e) => {
            error!("Account creation failed: {}", e);
            session.flash(DbFailure::of(&e).message("Database Error: account could not be created"));
            signup_page(&state, &session, &form, &FieldErrors::default())
        }
    }
}

/// GET /logout
pub async fn logout(session: Session) -> Response {
    if let Some(username) = session.username() {
        info!(username = %username, "User logged out");
    }
    session.remove_username();
    session.rotate_id();
    found("/")
}
