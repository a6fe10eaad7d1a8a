//! In-process store used when no database is configured, and by tests.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CalendarStore, RemovalRequestStore, ServerFilter, TaskStore, UserStore};
use crate::error::StoreError;
use crate::models::absence::{Absence, NewAbsence};
use crate::models::holiday::{Holiday, NewHoliday};
use crate::models::removal_request::{NewRemovalRequest, RemovalRequest, RemovalStatus};
use crate::models::task::{AuditStatus, NewTask, Recurrence, Task, TaskStatus, TaskUpdate};
use crate::models::user::{normalize_email, NewUser, User, UserUpdate};

#[derive(Debug, Default)]
struct Collections {
    tasks: Vec<Task>,
    users: Vec<User>,
    holidays: Vec<Holiday>,
    absences: Vec<Absence>,
    removal_requests: Vec<RemovalRequest>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A dated instance whose parent already has one on that date, either stored
/// or earlier in the same batch.
fn duplicate_instance<'a>(existing: &[Task], batch: &'a [Task]) -> Option<&'a Task> {
    batch.iter().enumerate().find_map(|(i, task)| {
        let parent = task.parent_task_id.as_deref()?;
        let same =
            |t: &Task| t.parent_task_id.as_deref() == Some(parent) && t.due_date == task.due_date;
        (existing.iter().any(same) || batch[..i].iter().any(same)).then_some(task)
    })
}

fn newest_first(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    tasks
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn fetch_tasks(&self, filter: &ServerFilter) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let rows = inner
            .tasks
            .iter()
            .filter(|t| match filter {
                ServerFilter::All => true,
                ServerFilter::AssignedTo(id) => &t.assigned_to_id == id,
                ServerFilter::AssignedBy(id) => &t.assigned_by_id == id,
                ServerFilter::Status(status) => t.status == *status,
            })
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        let mut created = self.create_tasks(vec![new]).await?;
        created
            .pop()
            .ok_or_else(|| StoreError::Query("empty insert".into()))
    }

    async fn create_tasks(&self, batch: Vec<NewTask>) -> Result<Vec<Task>, StoreError> {
        let now = Utc::now();
        let created: Vec<Task> = batch
            .into_iter()
            .map(|new| Task::from_new(new_id(), new, now))
            .collect();
        // One write lock for the check and the whole batch: readers see all of it or none.
        let mut inner = self.inner.write().await;
        if let Some(dup) = duplicate_instance(&inner.tasks, &created) {
            return Err(StoreError::Conflict(format!(
                "instance of {} due {}",
                dup.parent_task_id.as_deref().unwrap_or_default(),
                dup.due_date
            )));
        }
        inner.tasks.extend(created.iter().cloned());
        Ok(created)
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", id)))?;
        task.apply(update, Utc::now());
        Ok(task.clone())
    }

    async fn set_audit_status(
        &self,
        id: &str,
        status: AuditStatus,
        audited_by: &str,
    ) -> Result<Task, StoreError> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("task {}", id)))?;
        let now = Utc::now();
        task.audit_status = Some(status);
        task.audited_at = Some(now);
        task.audited_by = Some(audited_by.to_string());
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        if inner.tasks.len() == before {
            return Err(StoreError::NotFound(format!("task {}", id)));
        }
        Ok(())
    }

    async fn recent_completed(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn attachment_audit_candidates(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let rows = inner
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed && t.attachment_required)
            .cloned()
            .collect();
        let mut rows = newest_first(rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn incomplete_tasks_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let rows = inner
            .tasks
            .iter()
            .filter(|t| t.assigned_to_id == user_id && TaskStatus::OPEN_OVERDUE.contains(&t.status))
            .cloned()
            .collect();
        let mut rows = newest_first(rows);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn overdue_candidates(&self, today: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        let mut rows: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| t.is_open_overdue(today))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.due_date);
        Ok(rows)
    }

    async fn tasks_due_on(
        &self,
        date: NaiveDate,
        statuses: &[TaskStatus],
    ) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.due_date == date && statuses.contains(&t.status))
            .cloned()
            .collect())
    }

    async fn recurring_templates(&self, recurrence: Recurrence) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.recurring == recurrence && t.parent_task_id.is_none())
            .cloned()
            .collect())
    }

    async fn instance_exists(
        &self,
        parent_task_id: &str,
        due_date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.iter().any(|t| {
            t.parent_task_id.as_deref() == Some(parent_task_id) && t.due_date == due_date
        }))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.clone())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let user = User {
            id: new_id(),
            name: new.name,
            email: normalize_email(&new.email),
            role: new.role,
            phone: new.phone,
            city: new.city,
            password_hash: new.password_hash,
            approved: true,
            created_at: Some(Utc::now()),
        };
        self.inner.write().await.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        user.apply(update);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.users.len();
        inner.users.retain(|u| u.id != id);
        if inner.users.len() == before {
            return Err(StoreError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn list_holidays(&self) -> Result<Vec<Holiday>, StoreError> {
        let mut rows = self.inner.read().await.holidays.clone();
        rows.sort_by_key(|h| h.date);
        Ok(rows)
    }

    async fn add_holiday(&self, new: NewHoliday) -> Result<Holiday, StoreError> {
        let holiday = Holiday {
            id: new_id(),
            date: new.date,
            name: new.name,
            created_at: Utc::now(),
        };
        self.inner.write().await.holidays.push(holiday.clone());
        Ok(holiday)
    }

    async fn delete_holiday(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.holidays.len();
        inner.holidays.retain(|h| h.id != id);
        if inner.holidays.len() == before {
            return Err(StoreError::NotFound(format!("holiday {}", id)));
        }
        Ok(())
    }

    async fn list_absences(&self) -> Result<Vec<Absence>, StoreError> {
        let mut rows = self.inner.read().await.absences.clone();
        rows.sort_by(|a, b| b.from_date.cmp(&a.from_date));
        Ok(rows)
    }

    async fn add_absence(&self, new: NewAbsence) -> Result<Absence, StoreError> {
        let absence = Absence {
            id: new_id(),
            user_id: new.user_id,
            user_name: new.user_name,
            from_date: new.from_date,
            to_date: new.to_date,
            reason: new.reason,
            created_at: Utc::now(),
        };
        self.inner.write().await.absences.push(absence.clone());
        Ok(absence)
    }
}

#[async_trait]
impl RemovalRequestStore for MemoryStore {
    async fn list_removal_requests(&self) -> Result<Vec<RemovalRequest>, StoreError> {
        let mut rows = self.inner.read().await.removal_requests.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_removal_request(&self, id: &str) -> Result<Option<RemovalRequest>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.removal_requests.iter().find(|r| r.id == id).cloned())
    }

    async fn create_removal_request(
        &self,
        new: NewRemovalRequest,
    ) -> Result<RemovalRequest, StoreError> {
        let request = RemovalRequest {
            id: new_id(),
            task_id: new.task_id,
            task_title: new.task_title,
            requested_by_id: new.requested_by_id,
            requested_by_name: new.requested_by_name,
            reason: new.reason,
            status: RemovalStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        };
        self.inner.write().await.removal_requests.push(request.clone());
        Ok(request)
    }

    async fn resolve_removal_request(
        &self,
        id: &str,
        status: RemovalStatus,
        resolved_by: &str,
    ) -> Result<RemovalRequest, StoreError> {
        let mut inner = self.inner.write().await;
        let request = inner
            .removal_requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("removal request {}", id)))?;
        request.status = status;
        request.resolved_at = Some(Utc::now());
        request.resolved_by = Some(resolved_by.to_string());
        Ok(request.clone())
    }
}
