//! Domain models: users, tasks, goals and archived tasks
//!
//! Tag, status and progress values are closed enumerations. The string form
//! of each variant is what gets stored in SQLite and submitted by HTML forms,
//! so `as_str` and `FromStr` must stay exact inverses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Storage format for due timestamps (`2024-08-25 18:30:00`)
pub const DUE_STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format submitted by `<input type="datetime-local">`
pub const DUE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Formats accepted when reading a due timestamp back from the database
const DUE_READ_FORMATS: [&str; 4] = [
    DUE_STORAGE_FORMAT,
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    DUE_INPUT_FORMAT,
];

/// Parse a stored due timestamp
pub fn parse_due(value: &str) -> Result<NaiveDateTime, Error> {
    let value = value.trim();
    DUE_READ_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid due timestamp: {}", value)))
}

/// Format a due timestamp for storage
pub fn format_due(due: &NaiveDateTime) -> String {
    due.format(DUE_STORAGE_FORMAT).to_string()
}

fn serialize_due<S: Serializer>(due: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
    match due {
        Some(due) => s.serialize_str(&format_due(due)),
        None => s.serialize_none(),
    }
}

/// Household task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskTag {
    Cleaning,
    Cooking,
    Shopping,
    Gardening,
    Laundry,
    #[serde(rename = "DIY")]
    Diy,
    Finance,
    Home,
    Pets,
    Childcare,
}

impl TaskTag {
    pub const ALL: [TaskTag; 10] = [
        TaskTag::Cleaning,
        TaskTag::Cooking,
        TaskTag::Shopping,
        TaskTag::Gardening,
        TaskTag::Laundry,
        TaskTag::Diy,
        TaskTag::Finance,
        TaskTag::Home,
        TaskTag::Pets,
        TaskTag::Childcare,
    ];

    /// Stored / submitted value
    pub fn as_str(self) -> &'static str {
        match self {
            TaskTag::Cleaning => "cleaning",
            TaskTag::Cooking => "cooking",
            TaskTag::Shopping => "shopping",
            TaskTag::Gardening => "gardening",
            TaskTag::Laundry => "laundry",
            TaskTag::Diy => "DIY",
            TaskTag::Finance => "finance",
            TaskTag::Home => "home",
            TaskTag::Pets => "pets",
            TaskTag::Childcare => "childcare",
        }
    }

    /// Human-readable label for select boxes
    pub fn label(self) -> &'static str {
        match self {
            TaskTag::Cleaning => "Cleaning",
            TaskTag::Cooking => "Cooking",
            TaskTag::Shopping => "Shopping",
            TaskTag::Gardening => "Gardening",
            TaskTag::Laundry => "Laundry",
            TaskTag::Diy => "DIY",
            TaskTag::Finance => "Finance",
            TaskTag::Home => "Home",
            TaskTag::Pets => "Pets",
            TaskTag::Childcare => "Childcare",
        }
    }

    /// URL path segment (`/home_page/diy`)
    pub fn slug(self) -> &'static str {
        match self {
            TaskTag::Diy => "diy",
            other => other.as_str(),
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.slug() == slug)
    }
}

impl fmt::Display for TaskTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown task tag: {}", s)))
    }
}

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::New, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::New => "New",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown task status: {}", s)))
    }
}

/// How far along a goal is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalProgress {
    Achieved,
    #[serde(rename = "Almost Achieved")]
    AlmostAchieved,
    Attempted,
    #[serde(rename = "Not Today")]
    NotToday,
}

impl GoalProgress {
    pub const ALL: [GoalProgress; 4] = [
        GoalProgress::Achieved,
        GoalProgress::AlmostAchieved,
        GoalProgress::Attempted,
        GoalProgress::NotToday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GoalProgress::Achieved => "Achieved",
            GoalProgress::AlmostAchieved => "Almost Achieved",
            GoalProgress::Attempted => "Attempted",
            GoalProgress::NotToday => "Not Today",
        }
    }
}

impl fmt::Display for GoalProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalProgress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|progress| progress.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown goal progress: {}", s)))
    }
}

/// Registered account
///
/// Not `Serialize`: the password hash must never reach a template.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub name: String,
    pub password_hash: String,
}

/// Active household task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub task_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Free-text owner; not a reference to `users`
    pub owner: Option<String>,
    pub tag: TaskTag,
    #[serde(serialize_with = "serialize_due")]
    pub due: Option<NaiveDateTime>,
    pub status: TaskStatus,
}

/// Fields supplied when creating a task
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub tag: TaskTag,
    pub due: NaiveDateTime,
    pub status: TaskStatus,
}

/// Fields editable on an existing task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub description: Option<String>,
    pub owner: String,
    pub status: TaskStatus,
}

/// Personal goal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Goal {
    pub goal_id: i64,
    pub name: String,
    pub target: Option<String>,
    /// Unset until the owner records progress for the first time
    pub progress: Option<GoalProgress>,
    pub owner: String,
}

/// Fields supplied when creating a goal
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub name: String,
    pub target: Option<String>,
    pub owner: String,
}

/// Read-only snapshot of a completed task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchivedTask {
    pub task_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub owner: Option<String>,
    pub tag: TaskTag,
    #[serde(serialize_with = "serialize_due")]
    pub due: Option<NaiveDateTime>,
    /// Always `Completed`
    pub status: TaskStatus,
}
