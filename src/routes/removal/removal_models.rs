use serde::{Deserialize, Serialize};

use crate::models::removal_request::{RemovalRequest, RemovalStatus};

#[derive(Deserialize)]
pub struct CreateRemovalRequest {
    pub task_id: String,
    pub requested_by_id: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ResolveRemovalRequest {
    pub status: RemovalStatus,
    pub resolved_by: String,
}

#[derive(Serialize)]
pub struct RemovalRequestResponse {
    pub success: bool,
    pub message: String,
    pub request: Option<RemovalRequest>,
}

#[derive(Serialize)]
pub struct RemovalRequestListResponse {
    pub requests: Vec<RemovalRequest>,
}
