use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

string_enum! {
    pub enum RemovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl Default for RemovalStatus {
    fn default() -> Self {
        RemovalStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovalRequest {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub requested_by_id: String,
    pub requested_by_name: String,
    pub reason: String,
    pub status: RemovalStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct RemovalRequestRecord {
    pub id: String,
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub requested_by_id: Option<String>,
    pub requested_by_name: Option<String>,
    pub reason: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl From<RemovalRequestRecord> for RemovalRequest {
    fn from(r: RemovalRequestRecord) -> Self {
        RemovalRequest {
            id: r.id,
            task_id: r.task_id.unwrap_or_default(),
            task_title: r.task_title.unwrap_or_default(),
            requested_by_id: r.requested_by_id.unwrap_or_default(),
            requested_by_name: r.requested_by_name.unwrap_or_default(),
            reason: r.reason.unwrap_or_default(),
            status: r
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            created_at: r.created_at.unwrap_or_default(),
            resolved_at: r.resolved_at,
            resolved_by: r.resolved_by,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewRemovalRequest {
    pub task_id: String,
    pub task_title: String,
    pub requested_by_id: String,
    pub requested_by_name: String,
    pub reason: String,
}
