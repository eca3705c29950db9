use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;
use crate::filter::{ConditionSet, TimestampFilter, ToConditionSet, Value};
use crate::repository::{Entity, Patch};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl From<TaskPriority> for Value {
    fn from(p: TaskPriority) -> Self {
        Value::Enum {
            type_name: "task_priority",
            label: p.label(),
            rank: p as u8,
        }
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Todo,
    /// Task is currently being worked on.
    InProgress,
    Completed,
    /// Task was dropped without being completed.
    Cancelled,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl From<TaskStatus> for Value {
    fn from(s: TaskStatus) -> Self {
        Value::Enum {
            type_name: "task_status",
            label: s.label(),
            rank: s as u8,
        }
    }
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTaskInput {
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    pub due_date: DateTime<Utc>,
}

/// Input structure for a partial task update. Absent fields are left unchanged.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTaskInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    /// Identifier of the user who owns the task.
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owner summary, present only when the `user` relation was requested.
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Json<UserSummary>>,
}

impl Task {
    /// Creates a new `Task` owned by `user_id`, with a fresh id and both timestamps
    /// set to now.
    pub fn new(input: CreateTaskInput, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
            user_id,
            created_at: now,
            updated_at: now,
            user: None,
        }
    }
}

const USER_RELATION: &str = "(SELECT to_jsonb(owner) FROM (\
     SELECT users.id, users.email, users.full_name, users.role, users.created_at, users.updated_at \
     FROM users WHERE users.id = tasks.user_id) AS owner) AS \"user\"";

impl Entity for Task {
    type Patch = TaskPatch;

    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "description",
        "status",
        "priority",
        "due_date",
        "user_id",
        "created_at",
        "updated_at",
    ];
    const SORTABLE: &'static [&'static str] = &[
        "created_at",
        "updated_at",
        "title",
        "status",
        "priority",
        "due_date",
    ];

    fn field(&self, name: &str) -> Option<Value> {
        let value: Value = match name {
            "id" => self.id.into(),
            "title" => self.title.as_str().into(),
            "description" => self.description.clone().into(),
            "status" => self.status.into(),
            "priority" => self.priority.into(),
            "due_date" => self.due_date.into(),
            "user_id" => self.user_id.into(),
            "created_at" => self.created_at.into(),
            "updated_at" => self.updated_at.into(),
            _ => return None,
        };
        Some(value)
    }

    fn values(&self) -> Vec<(&'static str, Value)> {
        Self::COLUMNS
            .iter()
            .filter_map(|c| self.field(c).map(|v| (*c, v)))
            .collect()
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn relation(name: &str) -> Option<&'static str> {
        match name {
            "user" => Some(USER_RELATION),
            _ => None,
        }
    }
}

/// Field-by-field task update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<UpdateTaskInput> for TaskPatch {
    fn from(input: UpdateTaskInput) -> Self {
        Self {
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            due_date: input.due_date,
        }
    }
}

impl Patch<Task> for TaskPatch {
    fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(("title", Value::from(title.as_str())));
        }
        if let Some(description) = &self.description {
            out.push(("description", Value::from(description.as_str())));
        }
        if let Some(status) = self.status {
            out.push(("status", status.into()));
        }
        if let Some(priority) = self.priority {
            out.push(("priority", priority.into()));
        }
        if let Some(due_date) = self.due_date {
            out.push(("due_date", due_date.into()));
        }
        out
    }

    fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

/// Query parameters for filtering tasks when listing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(flatten)]
    pub timestamps: TimestampFilter,
    /// Case-insensitive partial match on the title.
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Tasks due on or after this instant, or from the start of this date.
    #[serde(default, deserialize_with = "crate::filter::range_start")]
    pub due_date_start: Option<DateTime<Utc>>,
    /// Tasks due on or before this instant, or by the end of this date.
    #[serde(default, deserialize_with = "crate::filter::range_end")]
    pub due_date_end: Option<DateTime<Utc>>,
}

impl ToConditionSet for TaskFilter {
    fn to_condition_set(&self) -> ConditionSet {
        self.timestamps
            .to_condition_set()
            .contains("title", self.title.as_deref())
            .eq_opt("status", self.status)
            .eq_opt("priority", self.priority)
            .range("due_date", self.due_date_start, self.due_date_end)
    }
}
