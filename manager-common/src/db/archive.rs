//! Archived task queries
//!
//! Archived rows are immutable (an UPDATE trigger aborts). The only write is
//! `archive_task`, which moves a completed task out of `tasks` in one
//! transaction.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

use crate::models::{parse_due, ArchivedTask, TaskStatus};
use crate::{Error, Result};

/// Outcome of an archive request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Archived,
    NotFound,
    /// Only completed tasks can be archived
    NotCompleted(TaskStatus),
}

fn archived_from_row(row: &SqliteRow) -> Result<ArchivedTask> {
    let tag: String = row.try_get("task_tag")?;
    let status: TaskStatus = row.try_get::<String, _>("task_status")?.parse()?;
    let due: Option<String> = row.try_get("task_due")?;

    if status != TaskStatus::Completed {
        return Err(Error::Internal(format!(
            "Archived task has status '{}', expected 'Completed'",
            status
        )));
    }

    Ok(ArchivedTask {
        task_id: row.try_get("task_id")?,
        name: row.try_get("task_name")?,
        description: row.try_get("task_description")?,
        owner: row.try_get("task_owner")?,
        tag: tag.parse()?,
        due: due.as_deref().map(parse_due).transpose()?,
        status,
    })
}

/// Every archived task, most recently archived first
pub async fn list_archived_tasks(pool: &SqlitePool) -> Result<Vec<ArchivedTask>> {
    let rows = sqlx::query(
        r#"
        SELECT task_id, task_name, task_description, task_owner, task_tag, task_due, task_status
        FROM archived_tasks
        ORDER BY archived_at DESC, task_id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(archived_from_row).collect()
}

/// Move a completed task into the archive
pub async fn archive_task(pool: &SqlitePool, task_id: i64) -> Result<ArchiveOutcome> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        "SELECT task_id, task_name, task_description, task_owner, task_tag, task_due, task_status FROM tasks WHERE task_id = ?",
    )
    .bind(task_id)
    .fetch_optional(&mut *tx)
    .await?;

    let task = match row {
        Some(row) => crate::db::tasks::task_from_row(&row)?,
        None => return Ok(ArchiveOutcome::NotFound),
    };

    if task.status != TaskStatus::Completed {
        return Ok(ArchiveOutcome::NotCompleted(task.status));
    }

    sqlx::query(
        r#"
        INSERT INTO archived_tasks (task_id, task_name, task_description, task_owner, task_tag, task_due, task_status)
        SELECT task_id, task_name, task_description, task_owner, task_tag, task_due, task_status
        FROM tasks WHERE task_id = ?
        "#,
    )
    .bind(task_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM tasks WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(task_id, name = %task.name, "Archived completed task");
    Ok(ArchiveOutcome::Archived)
}
