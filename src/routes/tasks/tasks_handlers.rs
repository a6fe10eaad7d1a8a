use actix_web::{web, HttpResponse, Responder};
use chrono::{NaiveDate, Utc};
use log::{error, info, warn};

use super::tasks_models::{
    AuditTaskRequest, CompleteTaskRequest, CreateTaskRequest, TaskListResponse, TaskResponse,
    UpdateTaskRequest,
};
use crate::attendance::is_holiday;
use crate::models::task::{
    normalize_weekdays, AttachmentType, NewTask, Recurrence, Task, TaskStatus, TaskUpdate,
};
use crate::models::user::User;
use crate::phone;
use crate::routes::common::{bad_request, not_found, ok_message, parse_request_date, store_failure};
use crate::state::AppState;
use crate::store::{CalendarStore, TaskQuery, TaskStore, UserStore};

const RECENT_COMPLETED_LIMIT: usize = 10;
const BOGUS_ATTACHMENT_LIMIT: usize = 50;
const INCOMPLETE_LIMIT: usize = 100;

fn task_ok(message: &str, task: Task) -> HttpResponse {
    HttpResponse::Ok().json(TaskResponse {
        success: true,
        message: message.into(),
        task: Some(task),
    })
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, HttpResponse> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_request_date(field, raw).map(Some),
        None => Ok(None),
    }
}

pub async fn list_tasks(state: web::Data<AppState>, query: web::Query<TaskQuery>) -> impl Responder {
    match state.store.list_tasks(&query).await {
        Ok(tasks) => HttpResponse::Ok().json(TaskListResponse { tasks }),
        Err(e) => store_failure("list tasks", e),
    }
}

pub async fn get_task(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.store.get_task(&id).await {
        Ok(Some(task)) => task_ok("Task found", task),
        Ok(None) => not_found("Task not found"),
        Err(e) => store_failure("load task", e),
    }
}

pub async fn create_task(
    state: web::Data<AppState>,
    req: web::Json<CreateTaskRequest>,
) -> impl Responder {
    let req = req.into_inner();
    if req.title.trim().is_empty() {
        return bad_request("Title is required");
    }
    let due_date = match parse_request_date("due_date", &req.due_date) {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    let start_date = match parse_optional_date("start_date", req.start_date.as_deref()) {
        Ok(date) => date,
        Err(resp) => return resp,
    };

    let assignee = match state.store.get_user(&req.assigned_to_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return bad_request("Unknown assignee"),
        Err(e) => return store_failure("look up assignee", e),
    };
    let assigner = match state.store.get_user(&req.assigned_by_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return bad_request("Unknown assigner"),
        Err(e) => return store_failure("look up assigner", e),
    };
    let holidays = match state.store.list_holidays().await {
        Ok(holidays) => holidays,
        Err(e) => return store_failure("load holidays", e),
    };

    let recurring_days = if req.recurring == Recurrence::Daily {
        normalize_weekdays(req.recurring_days)
    } else {
        Vec::new()
    };
    let new = NewTask {
        title: req.title.trim().to_string(),
        description: req.description,
        start_date,
        due_date,
        priority: req.priority,
        status: TaskStatus::Pending,
        recurring: req.recurring,
        recurring_days,
        attachment_required: req.attachment_required,
        attachment_type: req.attachment_type,
        attachment_description: req.attachment_description,
        assigned_to_id: assignee.id.clone(),
        assigned_to_name: assignee.name.clone(),
        assigned_to_city: assignee.city.clone(),
        assigned_by_id: assigner.id.clone(),
        assigned_by_name: assigner.name.clone(),
        parent_task_id: None,
        is_holiday: is_holiday(due_date, &holidays),
    };

    let task = match state.store.create_task(new).await {
        Ok(task) => task,
        Err(e) => return store_failure("create task", e),
    };
    info!("Task {} assigned to {}", task.id, task.assigned_to_id);

    notify_assignment(&state, &assignee, &task).await;
    task_ok("Task created", task)
}

// The task is already stored; a failed message is only logged.
async fn notify_assignment(state: &AppState, assignee: &User, task: &Task) {
    if !state.notifier.is_configured() {
        warn!("Notifier not configured, no assignment message for task {}", task.id);
        return;
    }
    let phone = match assignee.phone.as_deref().map(phone::normalize) {
        Some(phone) if !phone.is_empty() => phone,
        _ => {
            info!("Assignee {} has no usable phone, skipping message", assignee.id);
            return;
        }
    };
    let link = format!(
        "{}/#/tasks?highlight={}",
        state.config.app_base_url.trim_end_matches('/'),
        task.id
    );
    let params = [
        task.title.clone(),
        task.due_date.to_string(),
        task.priority.to_string(),
        task.description.clone(),
        link,
    ];
    let template = &state.config.notifier.template_task_assigned;
    if let Err(e) = state.notifier.send_template(&phone, template, &params).await {
        warn!("Failed to send assignment message for task {}: {}", task.id, e);
    }
}

pub async fn update_task(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UpdateTaskRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let req = req.into_inner();
    let mut update = req.fields;
    match parse_optional_date("due_date", req.due_date.as_deref()) {
        Ok(Some(date)) => update.due_date = Some(date),
        Ok(None) => {}
        Err(resp) => return resp,
    }
    match parse_optional_date("start_date", req.start_date.as_deref()) {
        Ok(Some(date)) => update.start_date = Some(date),
        Ok(None) => {}
        Err(resp) => return resp,
    }
    if update.completed_at.is_some() {
        update.status = Some(TaskStatus::Completed);
    }

    match state.store.update_task(&id, update).await {
        Ok(task) => task_ok("Task updated", task),
        Err(e) => store_failure("update task", e),
    }
}

/// Evidence a task must carry before it may be completed.
fn missing_evidence(task: &Task, req: &CompleteTaskRequest) -> Option<&'static str> {
    if !task.attachment_required {
        return None;
    }
    let has = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    match task.attachment_type {
        Some(AttachmentType::Media) if !has(&req.attachment_url) => Some("An attachment is required"),
        Some(AttachmentType::Text) if !has(&req.attachment_text) => Some("A text response is required"),
        None if !has(&req.attachment_url) && !has(&req.attachment_text) => {
            Some("An attachment is required")
        }
        _ => None,
    }
}

pub async fn complete_task(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: Option<web::Json<CompleteTaskRequest>>,
) -> impl Responder {
    let id = path.into_inner();
    let req = req.map(|r| r.into_inner()).unwrap_or_default();

    let task = match state.store.get_task(&id).await {
        Ok(Some(task)) => task,
        Ok(None) => return not_found("Task not found"),
        Err(e) => return store_failure("load task", e),
    };
    if let Some(message) = missing_evidence(&task, &req) {
        info!("Refusing to complete task {}: {}", id, message);
        return bad_request(message);
    }

    let update = TaskUpdate {
        status: Some(TaskStatus::Completed),
        completed_at: Some(Utc::now()),
        attachment_url: req.attachment_url,
        attachment_text: req.attachment_text,
        ..Default::default()
    };
    match state.store.update_task(&id, update).await {
        Ok(task) => {
            info!("Task {} completed", id);
            task_ok("Task completed", task)
        }
        Err(e) => store_failure("complete task", e),
    }
}

pub async fn audit_task(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<AuditTaskRequest>,
) -> impl Responder {
    let id = path.into_inner();
    match state
        .store
        .set_audit_status(&id, req.audit_status, &req.audited_by)
        .await
    {
        Ok(task) => {
            info!("Task {} audited as {}", id, req.audit_status);
            task_ok("Audit recorded", task)
        }
        Err(e) => store_failure("audit task", e),
    }
}

pub async fn delete_task(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.store.delete_task(&id).await {
        Ok(()) => {
            info!("Task {} deleted", id);
            ok_message("Task deleted")
        }
        Err(e) => store_failure("delete task", e),
    }
}

pub async fn recent_completed(state: web::Data<AppState>) -> impl Responder {
    match state.store.recent_completed(RECENT_COMPLETED_LIMIT).await {
        Ok(tasks) => HttpResponse::Ok().json(TaskListResponse { tasks }),
        Err(e) => store_failure("list completed tasks", e),
    }
}

pub async fn bogus_attachments(state: web::Data<AppState>) -> impl Responder {
    match state.store.attachment_audit_candidates(BOGUS_ATTACHMENT_LIMIT).await {
        Ok(tasks) => HttpResponse::Ok().json(TaskListResponse { tasks }),
        Err(e) => store_failure("list attachment audits", e),
    }
}

pub async fn incomplete_for_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let user_id = path.into_inner();
    match state.store.incomplete_tasks_for(&user_id, INCOMPLETE_LIMIT).await {
        Ok(tasks) => HttpResponse::Ok().json(TaskListResponse { tasks }),
        Err(e) => {
            error!("Failed to load incomplete tasks for {}", user_id);
            store_failure("list incomplete tasks", e)
        }
    }
}
