//! Goal pages: overview, create, update progress
//!
//! Goals are personal: the overview lists only the session user's goals and
//! updating someone else's goal is forbidden.

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use manager_common::db::{goals, DbFailure};
use manager_common::models::Goal;
use tera::Context;
use tracing::{error, info, warn};

use crate::api::{found, parse_id};
use crate::error::{AppError, AppResult};
use crate::forms::{progress_choices, FieldErrors, GoalForm, UpdateGoalForm};
use crate::render::render;
use crate::session::CurrentUser;
use crate::AppState;

/// GET /overview-goals
pub async fn overview_goals(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let goals = match goals::list_goals_for_owner(&state.db, &user.username).await {
        Ok(goals) => goals,
        Err(e) => {
            error!("Failed to list goals: {}", e);
            user.session.flash("Error occurred while retrieving goals");
            Vec::new()
        }
    };

    let mut context = Context::new();
    context.insert("goals", &goals);
    render(&state.templates, &user.session, "overview_goals.html", context)
}

fn add_goal_page(state: &AppState, user: &CurrentUser, form: &GoalForm, errors: &FieldErrors) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    render(&state.templates, &user.session, "add_goal.html", context)
}

/// GET /add-goal
pub async fn show_add_goal(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let form = GoalForm {
        owner: user.username.clone(),
        ..GoalForm::default()
    };
    add_goal_page(&state, &user, &form, &FieldErrors::default())
}

/// POST /add-goal
pub async fn add_goal(State(state): State<AppState>, user: CurrentUser, Form(form): Form<GoalForm>) -> AppResult<Response> {
    let goal = match form.validate() {
        Ok(goal) => goal,
        Err(errors) => return add_goal_page(&state, &user, &form, &errors),
    };

    match goals::create_goal(&state.db, &goal).await {
        Ok(goal_id) => {
            info!(goal_id, owner = %goal.owner, "Goal created");
            user.session.flash("Goal created");
            Ok(found("/overview-goals"))
        }
        Err(e) => {
            error!("Failed to create goal: {}", e);
            user.session
                .flash(DbFailure::of(&e).message("Database Error: goal could not be created"));
            add_goal_page(&state, &user, &form, &FieldErrors::default())
        }
    }
}

/// Goal owned by the session user
async fn load_own_goal(state: &AppState, user: &CurrentUser, raw_id: &str) -> AppResult<Goal> {
    let goal_id = parse_id(raw_id, "Goal")?;
    let goal = goals::get_goal(&state.db, goal_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Goal {} not found", goal_id)))?;

    if goal.owner != user.username {
        warn!(goal_id, username = %user.username, "Attempt to update another user's goal");
        return Err(AppError::Forbidden("You can only update your own goals".to_string()));
    }

    Ok(goal)
}

fn update_goal_page(
    state: &AppState,
    user: &CurrentUser,
    goal: &Goal,
    form: &UpdateGoalForm,
    errors: &FieldErrors,
) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("goal", goal);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("progress_choices", &progress_choices());
    render(&state.templates, &user.session, "update_goal.html", context)
}

/// GET /update-goal/:goal_id
pub async fn show_update_goal(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(goal_id): Path<String>,
) -> AppResult<Response> {
    let goal = load_own_goal(&state, &user, &goal_id).await?;
    let form = UpdateGoalForm {
        progress: goal.progress.map(|p| p.to_string()).unwrap_or_default(),
    };
    update_goal_page(&state, &user, &goal, &form, &FieldErrors::default())
}

/// POST /update-goal/:goal_id
pub async fn update_goal(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(goal_id): Path<String>,
    Form(form): Form<UpdateGoalForm>,
) -> AppResult<Response> {
    let goal = load_own_goal(&state, &user, &goal_id).await?;

    let progress = match form.validate() {
        Ok(progress) => progress,
        Err(errors) => return update_goal_page(&state, &user, &goal, &form, &errors),
    };

    match goals::update_goal_progress(&state.db, goal.goal_id, progress).await {
        Ok(true) => {
            info!(goal_id = goal.goal_id, progress = %progress, "Goal updated");
            user.session.flash("Goal updated");
            Ok(found("/overview-goals"))
        }
        Ok(false) => Err(AppError::NotFound(format!("Goal {} not found", goal.goal_id))),
        Err(e) => {
            error!(goal_id = goal.goal_id, "Failed to update goal: {}", e);
            user.session
                .flash(DbFailure::of(&e).message("Database Error: goal could not be updated"));
            update_goal_page(&state, &user, &goal, &form, &FieldErrors::default())
        }
    }
}
