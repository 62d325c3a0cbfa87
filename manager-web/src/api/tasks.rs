//! Task pages: overview, create, update, claim, archive

use axum::{
    extract::{Path, State},
    response::Response,
    Form,
};
use manager_common::db::{archive, archive::ArchiveOutcome, tasks, DbFailure};
use manager_common::models::Task;
use tera::Context;
use tracing::{error, info};

use crate::api::{found, parse_id};
use crate::error::{AppError, AppResult};
use crate::forms::{status_choices, tag_choices, FieldErrors, TaskForm, UpdateTaskForm};
use crate::render::render;
use crate::session::CurrentUser;
use crate::AppState;

/// GET /app
pub async fn app_home(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("username", &user.username);
    render(&state.templates, &user.session, "app_home.html", context)
}

/// GET /overview-tasks
pub async fn overview_tasks(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let tasks = match tasks::list_tasks(&state.db).await {
        Ok(tasks) => tasks,
        Err(e) => {
            error!("Failed to list tasks: {}", e);
            user.session.flash("Error occurred while retrieving tasks");
            Vec::new()
        }
    };

    let mut context = Context::new();
    context.insert("tasks", &tasks);
    render(&state.templates, &user.session, "overview_tasks.html", context)
}

/// GET /archived-tasks
pub async fn archived_tasks(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let archived = match archive::list_archived_tasks(&state.db).await {
        Ok(archived) => archived,
        Err(e) => {
            error!("Failed to list archived tasks: {}", e);
            user.session.flash("Error occurred while retrieving archived tasks");
            Vec::new()
        }
    };

    let mut context = Context::new();
    context.insert("archived_tasks", &archived);
    render(&state.templates, &user.session, "archived_tasks.html", context)
}

fn add_task_page(state: &AppState, user: &CurrentUser, form: &TaskForm, errors: &FieldErrors) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("tag_choices", &tag_choices());
    context.insert("status_choices", &status_choices());
    render(&state.templates, &user.session, "add_task.html", context)
}

/// GET /add-task
pub async fn show_add_task(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let form = TaskForm {
        status: "New".to_string(),
        ..TaskForm::default()
    };
    add_task_page(&state, &user, &form, &FieldErrors::default())
}

/// POST /add-task
pub async fn add_task(State(state): State<AppState>, user: CurrentUser, Form(form): Form<TaskForm>) -> AppResult<Response> {
    let task = match form.validate() {
        Ok(task) => task,
        Err(errors) => return add_task_page(&state, &user, &form, &errors),
    };

    match tasks::create_task(&state.db, &task).await {
        Ok(task_id) => {
            info!(task_id, name = %task.name, "Task created");
            user.session.flash("Task created");
            Ok(found("/overview-tasks"))
        }
        Err(e) => {
            error!("Failed to create task: {}", e);
            user.session
                .flash(DbFailure::of(&e).message("Database Error: task could not be created"));
            add_task_page(&state, &user, &form, &FieldErrors::default())
        }
    }
}

async fn load_task(state: &AppState, raw_id: &str) -> AppResult<Task> {
    let task_id = parse_id(raw_id, "Task")?;
    tasks::get_task(&state.db, task_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {} not found", task_id)))
}

fn update_task_page(
    state: &AppState,
    user: &CurrentUser,
    task: &Task,
    form: &UpdateTaskForm,
    errors: &FieldErrors,
) -> AppResult<Response> {
    let mut context = Context::new();
    context.insert("task", task);
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("status_choices", &status_choices());
    render(&state.templates, &user.session, "update_task.html", context)
}

/// GET /update-task/:task_id
pub async fn show_update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task = load_task(&state, &task_id).await?;
    let form = UpdateTaskForm {
        description: task.description.clone().unwrap_or_default(),
        owner: task.owner.clone().unwrap_or_default(),
        status: task.status.to_string(),
    };
    update_task_page(&state, &user, &task, &form, &FieldErrors::default())
}

/// POST /update-task/:task_id
pub async fn update_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
    Form(form): Form<UpdateTaskForm>,
) -> AppResult<Response> {
    let task = load_task(&state, &task_id).await?;

    let update = match form.validate() {
        Ok(update) => update,
        Err(errors) => return update_task_page(&state, &user, &task, &form, &errors),
    };

    match tasks::update_task(&state.db, task.task_id, &update).await {
        Ok(true) => {
            info!(task_id = task.task_id, status = %update.status, "Task updated");
            user.session.flash("Task updated");
            Ok(found("/overview-tasks"))
        }
        Ok(false) => Err(AppError::NotFound(format!("Task {} not found", task.task_id))),
        Err(e) => {
            error!(task_id = task.task_id, "Failed to update task: {}", e);
            user.session
                .flash(DbFailure::of(&e).message("Database Error: task could not be updated"));
            update_task_page(&state, &user, &task, &form, &FieldErrors::default())
        }
    }
}

/// POST /claim-task/:task_id
pub async fn claim_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task = load_task(&state, &task_id).await?;

    match tasks::claim_task(&state.db, task.task_id, &user.username).await {
        Ok(true) => {
            info!(task_id = task.task_id, username = %user.username, "Task claimed");
            user.session.flash("Task claimed");
        }
        Ok(false) => return Err(AppError::NotFound(format!("Task {} not found", task.task_id))),
        Err(e) => {
            error!(task_id = task.task_id, "Failed to claim task: {}", e);
            user.session
                .flash(DbFailure::of(&e).message("Database Error: task could not be claimed"));
        }
    }

    Ok(found("/overview-tasks"))
}

/// POST /archive-task/:task_id
pub async fn archive_task(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task_id = parse_id(&task_id, "Task")?;

    match archive::archive_task(&state.db, task_id).await {
        Ok(ArchiveOutcome::Archived) => user.session.flash("Task archived"),
        Ok(ArchiveOutcome::NotFound) => {
            return Err(AppError::NotFound(format!("Task {} not found", task_id)));
        }
        Ok(ArchiveOutcome::NotCompleted(_)) => user.session.flash("Only completed tasks can be archived"),
        Err(e) => {
            error!(task_id, "Failed to archive task: {}", e);
            user.session
                .flash(DbFailure::of(&e).message("Database Error: task could not be archived"));
        }
    }

    Ok(found("/overview-tasks"))
}
