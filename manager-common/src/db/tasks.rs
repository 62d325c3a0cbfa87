//! Active task queries

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::models::{format_due, parse_due, NewTask, Task, TaskUpdate};
use crate::Result;

const TASK_COLUMNS: &str =
    "task_id, task_name, task_description, task_owner, task_tag, task_due, task_status";

pub(crate) fn task_from_row(row: &SqliteRow) -> Result<Task> {
    let tag: String = row.try_get("task_tag")?;
    let status: String = row.try_get("task_status")?;
    let due: Option<String> = row.try_get("task_due")?;

    Ok(Task {
        task_id: row.try_get("task_id")?,
        name: row.try_get("task_name")?,
        description: row.try_get("task_description")?,
        owner: row.try_get("task_owner")?,
        tag: tag.parse()?,
        due: due.as_deref().map(parse_due).transpose()?,
        status: status.parse()?,
    })
}

/// Every active task, oldest first
pub async fn list_tasks(pool: &SqlitePool) -> Result<Vec<Task>> {
    let rows = sqlx::query(&format!("SELECT {} FROM tasks ORDER BY task_id", TASK_COLUMNS))
        .fetch_all(pool)
        .await?;

    rows.iter().map(task_from_row).collect()
}

pub async fn get_task(pool: &SqlitePool, task_id: i64) -> Result<Option<Task>> {
    let row = sqlx::query(&format!("SELECT {} FROM tasks WHERE task_id = ?", TASK_COLUMNS))
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(task_from_row).transpose()
}

/// Insert a task and return its id
pub async fn create_task(pool: &SqlitePool, task: &NewTask) -> Result<i64> {
    let done = sqlx::query(
        r#"
        INSERT INTO tasks (task_name, task_description, task_owner, task_tag, task_due, task_status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.name)
    .bind(&task.description)
    .bind(&task.owner)
    .bind(task.tag.as_str())
    .bind(format_due(&task.due))
    .bind(task.status.as_str())
    .execute(pool)
    .await?;

    Ok(done.last_insert_rowid())
}

/// Apply an update; `false` when no task has that id
pub async fn update_task(pool: &SqlitePool, task_id: i64, update: &TaskUpdate) -> Result<bool> {
    let done = sqlx::query(
        "UPDATE tasks SET task_description = ?, task_owner = ?, task_status = ? WHERE task_id = ?",
    )
    .bind(&update.description)
    .bind(&update.owner)
    .bind(update.status.as_str())
    .bind(task_id)
    .execute(pool)
    .await?;

    Ok(done.rows_affected() > 0)
}

/// Make `username` the owner of a task; `false` when no task has that id
pub async fn claim_task(pool: &SqlitePool, task_id: i64, username: &str) -> Result<bool> {
    let done = sqlx::query("UPDATE tasks SET task_owner = ? WHERE task_id = ?")
        .bind(username)
        .bind(task_id)
        .execute(pool)
        .await?;

    Ok(done.rows_affected() > 0)
}
