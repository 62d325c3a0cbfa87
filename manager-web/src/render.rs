//! HTML rendering
//!
//! Templates are compiled into the binary. Every page gets the pending flash
//! messages, the session's CSRF token and the logged-in username.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tera::{Context, Tera};
use tracing::error;

use crate::error::{error_page, AppError, AppResult};
use crate::session::Session;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("app_home.html", include_str!("../templates/app_home.html")),
    ("overview_tasks.html", include_str!("../templates/overview_tasks.html")),
    ("overview_goals.html", include_str!("../templates/overview_goals.html")),
    ("archived_tasks.html", include_str!("../templates/archived_tasks.html")),
    ("add_task.html", include_str!("../templates/add_task.html")),
    ("add_goal.html", include_str!("../templates/add_goal.html")),
    ("update_task.html", include_str!("../templates/update_task.html")),
    ("update_goal.html", include_str!("../templates/update_goal.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("home_page.html", include_str!("../templates/home_page.html")),
    ("playlist.html", include_str!("../templates/playlist.html")),
];

/// Build the template engine
pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    Ok(tera)
}

/// Render a page with status 200
pub fn render(tera: &Tera, session: &Session, template: &str, context: Context) -> AppResult<Response> {
    render_with_status(tera, session, StatusCode::OK, template, context)
}

pub fn render_with_status(
    tera: &Tera,
    session: &Session,
    status: StatusCode,
    template: &str,
    mut context: Context,
) -> AppResult<Response> {
    context.insert("flashes", &session.take_flashes());
    context.insert("csrf_token", &session.csrf_token());
    context.insert("current_user", &session.username());

    let html = tera.render(template, &context)?;
    Ok((status, Html(html)).into_response())
}

/// Render `error.html` with the pending flashes
///
/// Falls back to the standalone error page if the template itself fails.
pub fn render_error(tera: &Tera, session: &Session, status: StatusCode, message: &str) -> Response {
    let mut context = Context::new();
    context.insert("status_code", &status.as_u16());
    context.insert("message", message);

    match render_with_status(tera, session, status, "error.html", context) {
        Ok(response) => response,
        Err(AppError::Template(e)) => {
            error!("Failed to render error page: {}", e);
            error_page(status, message)
        }
        Err(e) => e.into_response(),
    }
}
