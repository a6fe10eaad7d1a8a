use serde::{Deserialize, Serialize};

use crate::models::task::{
    AttachmentType, AuditStatus, Priority, Recurrence, Task, TaskUpdate, WeekdayCode,
};

// Dates arrive as strings so a trailing time component can be tolerated.
#[derive(Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<String>,
    pub due_date: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub recurring: Recurrence,
    #[serde(default)]
    pub recurring_days: Vec<WeekdayCode>,
    #[serde(default)]
    pub attachment_required: bool,
    #[serde(default)]
    pub attachment_type: Option<AttachmentType>,
    #[serde(default)]
    pub attachment_description: Option<String>,
    pub assigned_to_id: String,
    pub assigned_by_id: String,
}

#[derive(Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(flatten)]
    pub fields: TaskUpdate,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CompleteTaskRequest {
    pub attachment_url: Option<String>,
    pub attachment_text: Option<String>,
}

#[derive(Deserialize)]
pub struct AuditTaskRequest {
    pub audit_status: AuditStatus,
    pub audited_by: String,
}

#[derive(Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub message: String,
    pub task: Option<Task>,
}

#[derive(Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}
