//! HTML form payloads and validation
//!
//! Every field is deserialized leniently (missing = empty string) so that an
//! incomplete submission re-renders the form with per-field errors instead of
//! being rejected by the extractor.

use chrono::NaiveDateTime;
use manager_common::models::{GoalProgress, NewGoal, NewTask, TaskStatus, TaskTag, TaskUpdate, DUE_INPUT_FORMAT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest accepted value for short text fields
pub const MAX_FIELD_LEN: usize = 255;

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Required text with a length limit; returns the trimmed value
fn required(errors: &mut FieldErrors, field: &'static str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > max {
        errors.add(field, format!("Field must be between 1 and {} characters long.", max));
    }
    value.to_string()
}

/// Optional text; blank becomes `None`
fn optional(errors: &mut FieldErrors, field: &'static str, value: &str, max: Option<usize>) -> Option<String> {
    let value = value.trim();
    if let Some(max) = max {
        if value.chars().count() > max {
            errors.add(field, format!("Field cannot be longer than {} characters.", max));
        }
    }
    (!value.is_empty()).then(|| value.to_string())
}

fn choice<T: std::str::FromStr>(errors: &mut FieldErrors, field: &'static str, value: &str) -> Option<T> {
    if value.trim().is_empty() {
        errors.add(field, "This field is required.");
        return None;
    }
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(field, "Not a valid choice.");
            None
        }
    }
}

fn due_field(errors: &mut FieldErrors, value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        errors.add("due", "This field is required.");
        return None;
    }
    match NaiveDateTime::parse_from_str(value, DUE_INPUT_FORMAT) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add("due", "Not a valid datetime value.");
            None
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = required(&mut errors, "username", &self.username, MAX_FIELD_LEN);
        // Passwords are compared verbatim
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        } else if self.password.chars().count() > MAX_FIELD_LEN {
            errors.add("password", format!("Field must be between 1 and {} characters long.", MAX_FIELD_LEN));
        }
        let password = self.password.clone();
        errors.into_result(|| (username, password))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

/// Validated signup fields
#[derive(Debug, Clone, PartialEq)]
pub struct Signup {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<Signup, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", &self.name, MAX_FIELD_LEN);
        let username = required(&mut errors, "username", &self.username, MAX_FIELD_LEN);
        if self.password.trim().is_empty() {
            errors.add("password", "This field is required.");
        } else if self.password.chars().count() > MAX_FIELD_LEN {
            errors.add("password", format!("Field must be between 1 and {} characters long.", MAX_FIELD_LEN));
        }
        let password = self.password.clone();
        errors.into_result(|| Signup { name, username, password })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TaskForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub due: String,
    #[serde(default)]
    pub status: String,
}

impl TaskForm {
    pub fn validate(&self) -> Result<NewTask, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", &self.name, MAX_FIELD_LEN);
        let description = optional(&mut errors, "description", &self.description, None);
        let owner = optional(&mut errors, "owner", &self.owner, Some(MAX_FIELD_LEN));
        let tag = choice::<TaskTag>(&mut errors, "tag", &self.tag);
        let due = due_field(&mut errors, &self.due);
        let status = choice::<TaskStatus>(&mut errors, "status", &self.status);

        match (tag, due, status) {
            (Some(tag), Some(due), Some(status)) if errors.is_empty() => Ok(NewTask {
                name,
                description,
                owner,
                tag,
                due,
                status,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateTaskForm {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub status: String,
}

impl UpdateTaskForm {
    pub fn validate(&self) -> Result<TaskUpdate, FieldErrors> {
        let mut errors = FieldErrors::default();
        let description = optional(&mut errors, "description", &self.description, None);
        let owner = required(&mut errors, "owner", &self.owner, MAX_FIELD_LEN);
        let status = choice::<TaskStatus>(&mut errors, "status", &self.status);

        match status {
            Some(status) if errors.is_empty() => Ok(TaskUpdate {
                description,
                owner,
                status,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GoalForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub owner: String,
}

impl GoalForm {
    pub fn validate(&self) -> Result<NewGoal, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = required(&mut errors, "name", &self.name, MAX_FIELD_LEN);
        let target = optional(&mut errors, "target", &self.target, None);
        let owner = required(&mut errors, "owner", &self.owner, MAX_FIELD_LEN);
        errors.into_result(|| NewGoal { name, target, owner })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UpdateGoalForm {
    #[serde(default)]
    pub progress: String,
}

impl UpdateGoalForm {
    pub fn validate(&self) -> Result<GoalProgress, FieldErrors> {
        let mut errors = FieldErrors::default();
        match choice::<GoalProgress>(&mut errors, "progress", &self.progress) {
            Some(progress) => Ok(progress),
            None => Err(errors),
        }
    }
}

/// Select box option
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

pub fn tag_choices() -> Vec<Choice> {
    TaskTag::ALL
        .iter()
        .map(|t| Choice {
            value: t.as_str(),
            label: t.label(),
        })
        .collect()
}

pub fn status_choices() -> Vec<Choice> {
    TaskStatus::ALL
        .iter()
        .map(|s| Choice {
            value: s.as_str(),
            label: s.as_str(),
        })
        .collect()
}

pub fn progress_choices() -> Vec<Choice> {
    GoalProgress::ALL
        .iter()
        .map(|p| Choice {
            value: p.as_str(),
            label: p.as_str(),
        })
        .collect()
}
