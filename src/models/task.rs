use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{non_blank, require, require_association, ParamKey};
use crate::error::{AppError, FieldErrors};
use crate::repository::NewTask;

/// A unit of work belonging to a team and assigned to a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub body: String,
    /// Application-defined status code.
    pub status: i32,
    pub team_id: i64,
    pub assignee_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes accepted when creating or updating a task.
///
/// Every field is required on create; on update absent fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(
        custom = "non_blank",
        length(max = 255, message = "is too long (maximum is 255 characters)")
    )]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom = "non_blank")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
}

impl ParamKey for TaskAttrs {
    const KEY: &'static str = "task";
}

impl TaskAttrs {
    /// Fills every absent attribute from `task`.
    pub fn merged_onto(self, task: &Task) -> Self {
        Self {
            title: self.title.or_else(|| Some(task.title.clone())),
            body: self.body.or_else(|| Some(task.body.clone())),
            status: self.status.or(Some(task.status)),
            team_id: self.team_id.or(Some(task.team_id)),
            assignee_id: self.assignee_id.or(Some(task.assignee_id)),
        }
    }

    pub fn check(&self) -> FieldErrors {
        let mut errors = self.validate().err().map(FieldErrors::from).unwrap_or_default();
        require(&mut errors, "title", &self.title);
        require(&mut errors, "body", &self.body);
        require(&mut errors, "status", &self.status);
        require_association(&mut errors, "team", &self.team_id);
        require_association(&mut errors, "assignee", &self.assignee_id);
        errors
    }

    /// Converts checked attributes into a storable record.
    pub fn into_record(self) -> Result<NewTask, AppError> {
        let errors = self.check();
        match self {
            TaskAttrs {
                title: Some(title),
                body: Some(body),
                status: Some(status),
                team_id: Some(team_id),
                assignee_id: Some(assignee_id),
            } if errors.is_empty() => Ok(NewTask {
                title,
                body,
                status,
                team_id,
                assignee_id,
            }),
            _ => Err(AppError::ValidationFailed(errors)),
        }
    }
}

/// Represents query parameters for filtering tasks when listing them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskQuery {
    pub team_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub status: Option<i32>,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        self.team_id.map_or(true, |id| task.team_id == id)
            && self.assignee_id.map_or(true, |id| task.assignee_id == id)
            && self.status.map_or(true, |status| task.status == status)
    }
}
