//! Store collaborator: the task, user, calendar and removal-request collections.
//!
//! The backing store only evaluates one equality predicate (or the fixed
//! overdue range) per query. Compound predicates run in two phases: the
//! backend applies the server-side filter, then [`TaskQuery::refine`] or the
//! assignee check in [`TaskStore::overdue_tasks`] narrows the rows locally.
//! Limits are applied after refinement so local filtering never drops rows
//! that would have fit.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::StoreError;
use crate::models::absence::{Absence, NewAbsence};
use crate::models::holiday::{Holiday, NewHoliday};
use crate::models::removal_request::{NewRemovalRequest, RemovalRequest, RemovalStatus};
use crate::models::task::{AuditStatus, NewTask, Recurrence, Task, TaskStatus, TaskUpdate};
use crate::models::user::{NewUser, User, UserUpdate};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Task listing filters as requested by callers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskQuery {
    pub assigned_to: Option<String>,
    pub assigned_by: Option<String>,
    pub status: Option<TaskStatus>,
    pub limit: Option<usize>,
}

/// The single predicate a backend evaluates for a [`TaskQuery`].
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFilter {
    All,
    AssignedTo(String),
    AssignedBy(String),
    Status(TaskStatus),
}

impl TaskQuery {
    /// First present of assignee, assigner, status.
    pub fn server_filter(&self) -> ServerFilter {
        if let Some(id) = &self.assigned_to {
            ServerFilter::AssignedTo(id.clone())
        } else if let Some(id) = &self.assigned_by {
            ServerFilter::AssignedBy(id.clone())
        } else if let Some(status) = self.status {
            ServerFilter::Status(status)
        } else {
            ServerFilter::All
        }
    }

    /// Local phase: assignee + status is the one pair the server cannot combine.
    pub fn refine(&self, mut tasks: Vec<Task>) -> Vec<Task> {
        if let (Some(_), Some(status)) = (&self.assigned_to, self.status) {
            tasks.retain(|t| t.status == status);
        }
        if let Some(limit) = self.limit {
            tasks.truncate(limit);
        }
        tasks
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Server-side phase of [`TaskStore::list_tasks`], newest `updated_at` first.
    async fn fetch_tasks(&self, filter: &ServerFilter) -> Result<Vec<Task>, StoreError>;

    async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError>;

    async fn create_task(&self, new: NewTask) -> Result<Task, StoreError>;

    /// Inserts every task or none of them. A second instance for the same
    /// parent and due date fails with [`StoreError::Conflict`].
    async fn create_tasks(&self, batch: Vec<NewTask>) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, StoreError>;

    async fn set_audit_status(
        &self,
        id: &str,
        status: AuditStatus,
        audited_by: &str,
    ) -> Result<Task, StoreError>;

    async fn delete_task(&self, id: &str) -> Result<(), StoreError>;

    /// Completed tasks, most recently completed first.
    async fn recent_completed(&self, limit: usize) -> Result<Vec<Task>, StoreError>;

    /// Completed tasks that required an attachment, newest `updated_at` first.
    async fn attachment_audit_candidates(&self, limit: usize) -> Result<Vec<Task>, StoreError>;

    /// Pending/overdue tasks assigned to `user_id`, newest `updated_at` first.
    async fn incomplete_tasks_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Task>, StoreError>;

    /// Server-side phase of [`TaskStore::overdue_tasks`]: status pending/overdue
    /// and due before `today`, oldest due date first.
    async fn overdue_candidates(&self, today: NaiveDate) -> Result<Vec<Task>, StoreError>;

    async fn tasks_due_on(
        &self,
        date: NaiveDate,
        statuses: &[TaskStatus],
    ) -> Result<Vec<Task>, StoreError>;

    /// Templates (no parent) with the given recurrence.
    async fn recurring_templates(&self, recurrence: Recurrence) -> Result<Vec<Task>, StoreError>;

    async fn instance_exists(
        &self,
        parent_task_id: &str,
        due_date: NaiveDate,
    ) -> Result<bool, StoreError>;

    async fn list_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let rows = self.fetch_tasks(&query.server_filter()).await?;
        Ok(query.refine(rows))
    }

    async fn overdue_tasks(
        &self,
        today: NaiveDate,
        assigned_to: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Task>, StoreError> {
        let mut rows = self.overdue_candidates(today).await?;
        if let Some(id) = assigned_to {
            rows.retain(|t| t.assigned_to_id == id);
        }
        if let Some(limit) = limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;
    async fn update_user(&self, id: &str, update: UserUpdate) -> Result<User, StoreError>;
    async fn delete_user(&self, id: &str) -> Result<(), StoreError>;
}

#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Ascending by date.
    async fn list_holidays(&self) -> Result<Vec<Holiday>, StoreError>;
    async fn add_holiday(&self, new: NewHoliday) -> Result<Holiday, StoreError>;
    async fn delete_holiday(&self, id: &str) -> Result<(), StoreError>;
    /// Most recent `from_date` first.
    async fn list_absences(&self) -> Result<Vec<Absence>, StoreError>;
    async fn add_absence(&self, new: NewAbsence) -> Result<Absence, StoreError>;
}

#[async_trait]
pub trait RemovalRequestStore: Send + Sync {
    /// Newest first.
    async fn list_removal_requests(&self) -> Result<Vec<RemovalRequest>, StoreError>;
    async fn get_removal_request(&self, id: &str) -> Result<Option<RemovalRequest>, StoreError>;
    async fn create_removal_request(
        &self,
        new: NewRemovalRequest,
    ) -> Result<RemovalRequest, StoreError>;
    async fn resolve_removal_request(
        &self,
        id: &str,
        status: RemovalStatus,
        resolved_by: &str,
    ) -> Result<RemovalRequest, StoreError>;
}

/// Everything the application reads and writes.
pub trait Store: TaskStore + UserStore + CalendarStore + RemovalRequestStore {}

impl<T> Store for T where T: TaskStore + UserStore + CalendarStore + RemovalRequestStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::task;

    #[test]
    fn server_filter_precedence() {
        let q = TaskQuery {
            assigned_to: Some("u1".into()),
            assigned_by: Some("m1".into()),
            status: Some(TaskStatus::Pending),
            limit: None,
        };
        assert_eq!(q.server_filter(), ServerFilter::AssignedTo("u1".into()));
        let q = TaskQuery {
            assigned_by: Some("m1".into()),
            status: Some(TaskStatus::Pending),
            ..Default::default()
        };
        assert_eq!(q.server_filter(), ServerFilter::AssignedBy("m1".into()));
        let q = TaskQuery {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert_eq!(q.server_filter(), ServerFilter::Status(TaskStatus::Completed));
        assert_eq!(TaskQuery::default().server_filter(), ServerFilter::All);
    }

    #[test]
    fn refine_applies_status_only_alongside_assignee() {
        let rows = vec![
            task("a", "u1", "2024-03-01", TaskStatus::Pending),
            task("b", "u1", "2024-03-01", TaskStatus::Completed),
        ];
        let both = TaskQuery {
            assigned_to: Some("u1".into()),
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        let refined = both.refine(rows.clone());
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].id, "b");

        // assigner + status: the server already used the assigner only and the
        // status is not a locally refined pair.
        let by = TaskQuery {
            assigned_by: Some("owner".into()),
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert_eq!(by.refine(rows.clone()).len(), 2);
    }

    #[test]
    fn limit_applies_after_refinement() {
        let rows = vec![
            task("a", "u1", "2024-03-01", TaskStatus::Pending),
            task("b", "u1", "2024-03-01", TaskStatus::Completed),
            task("c", "u1", "2024-03-01", TaskStatus::Completed),
        ];
        let q = TaskQuery {
            assigned_to: Some("u1".into()),
            status: Some(TaskStatus::Completed),
            limit: Some(1),
            ..Default::default()
        };
        let refined = q.refine(rows);
        assert_eq!(refined.len(), 1);
        assert_eq!(refined[0].id, "b");
    }
}
