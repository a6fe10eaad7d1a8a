use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};

use super::removal_models::{
    CreateRemovalRequest, RemovalRequestListResponse, RemovalRequestResponse, ResolveRemovalRequest,
};
use crate::error::StoreError;
use crate::models::removal_request::{NewRemovalRequest, RemovalStatus};
use crate::routes::common::{bad_request, not_found, store_failure, MessageResponse};
use crate::state::AppState;
use crate::store::{RemovalRequestStore, TaskStore, UserStore};

pub async fn list_requests(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_removal_requests().await {
        Ok(requests) => HttpResponse::Ok().json(RemovalRequestListResponse { requests }),
        Err(e) => store_failure("list removal requests", e),
    }
}

pub async fn create_request(
    state: web::Data<AppState>,
    req: web::Json<CreateRemovalRequest>,
) -> impl Responder {
    let req = req.into_inner();
    let task = match state.store.get_task(&req.task_id).await {
        Ok(Some(task)) => task,
        Ok(None) => return not_found("Task not found"),
        Err(e) => return store_failure("load task", e),
    };
    let requester = match state.store.get_user(&req.requested_by_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return bad_request("Unknown requester"),
        Err(e) => return store_failure("look up requester", e),
    };

    let new = NewRemovalRequest {
        task_id: task.id,
        task_title: task.title,
        requested_by_id: requester.id,
        requested_by_name: requester.name,
        reason: req.reason.trim().to_string(),
    };
    match state.store.create_removal_request(new).await {
        Ok(request) => {
            info!("Removal of task {} requested by {}", request.task_id, request.requested_by_id);
            HttpResponse::Ok().json(RemovalRequestResponse {
                success: true,
                message: "Removal requested".into(),
                request: Some(request),
            })
        }
        Err(e) => store_failure("create removal request", e),
    }
}

// Approval deletes the task first, then records the resolution. The two
// writes are independent; a task already gone does not block the record.
pub async fn resolve_request(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<ResolveRemovalRequest>,
) -> impl Responder {
    let id = path.into_inner();
    if req.status == RemovalStatus::Pending {
        return bad_request("Resolution must be approved or rejected");
    }

    let request = match state.store.get_removal_request(&id).await {
        Ok(Some(request)) => request,
        Ok(None) => return not_found("Removal request not found"),
        Err(e) => return store_failure("load removal request", e),
    };
    if request.status != RemovalStatus::Pending {
        return HttpResponse::Conflict().json(MessageResponse {
            success: false,
            message: format!("Removal request already {}", request.status),
        });
    }

    if req.status == RemovalStatus::Approved {
        match state.store.delete_task(&request.task_id).await {
            Ok(()) => info!("Task {} removed on request {}", request.task_id, id),
            Err(StoreError::NotFound(_)) => {
                warn!("Task {} already gone when approving {}", request.task_id, id)
            }
            Err(e) => return store_failure("delete task", e),
        }
    }

    match state
        .store
        .resolve_removal_request(&id, req.status, &req.resolved_by)
        .await
    {
        Ok(request) => HttpResponse::Ok().json(RemovalRequestResponse {
            success: true,
            message: format!("Removal request {}", request.status),
            request: Some(request),
        }),
        Err(e) => store_failure("resolve removal request", e),
    }
}
