//! Goal queries

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::models::{Goal, GoalProgress, NewGoal};
use crate::Result;

fn goal_from_row(row: &SqliteRow) -> Result<Goal> {
    let progress: Option<String> = row.try_get("goal_progress")?;

    Ok(Goal {
        goal_id: row.try_get("goal_id")?,
        name: row.try_get("goal_name")?,
        target: row.try_get("goal_target")?,
        progress: progress.as_deref().map(str::parse::<GoalProgress>).transpose()?,
        owner: row.try_get("goal_owner")?,
    })
}

/// Goals belonging to one user
pub async fn list_goals_for_owner(pool: &SqlitePool, owner: &str) -> Result<Vec<Goal>> {
    let rows = sqlx::query(
        "SELECT goal_id, goal_name, goal_target, goal_progress, goal_owner FROM goals WHERE goal_owner = ? ORDER BY goal_id",
    )
    .bind(owner)
    .fetch_all(pool)
    .await?;

    rows.iter().map(goal_from_row).collect()
}

pub async fn get_goal(pool: &SqlitePool, goal_id: i64) -> Result<Option<Goal>> {
    let row = sqlx::query(
        "SELECT goal_id, goal_name, goal_target, goal_progress, goal_owner FROM goals WHERE goal_id = ?",
    )
    .bind(goal_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(goal_from_row).transpose()
}

/// Insert a goal (progress unset) and return its id
pub async fn create_goal(pool: &SqlitePool, goal: &NewGoal) -> Result<i64> {
    let done = sqlx::query("INSERT INTO goals (goal_name, goal_target, goal_owner) VALUES (?, ?, ?)")
        .bind(&goal.name)
        .bind(&goal.target)
        .bind(&goal.owner)
        .execute(pool)
        .await?;

    Ok(done.last_insert_rowid())
}

/// Record progress; `false` when no goal has that id
pub async fn update_goal_progress(pool: &SqlitePool, goal_id: i64, progress: GoalProgress) -> Result<bool> {
    let done = sqlx::query("UPDATE goals SET goal_progress = ? WHERE goal_id = ?")
        .bind(progress.as_str())
        .bind(goal_id)
        .execute(pool)
        .await?;

    Ok(done.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    fn goal_for(owner: &str, name: &str) -> NewGoal {
        NewGoal {
            name: name.to_string(),
            target: Some("Test Target".to_string()),
            owner: owner.to_string(),
        }
    }

    #[tokio::test]
    async fn test_goals_are_filtered_by_owner() {
        let pool = init_memory_database().await.unwrap();
        create_goal(&pool, &goal_for("Test User", "Run 5k")).await.unwrap();
        create_goal(&pool, &goal_for("Someone Else", "Read a book")).await.unwrap();

        let mine = list_goals_for_owner(&pool, "Test User").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Run 5k");
        assert_eq!(mine[0].progress, None);
    }

    #[tokio::test]
    async fn test_update_progress() {
        let pool = init_memory_database().await.unwrap();
        let id = create_goal(&pool, &goal_for("Test User", "Run 5k")).await.unwrap();

        assert!(update_goal_progress(&pool, id, GoalProgress::AlmostAchieved).await.unwrap());
        let goal = get_goal(&pool, id).await.unwrap().unwrap();
        assert_eq!(goal.progress, Some(GoalProgress::AlmostAchieved));

        assert!(!update_goal_progress(&pool, id + 1, GoalProgress::Achieved).await.unwrap());
    }
}
