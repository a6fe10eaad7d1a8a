//! Materializes today's instances of daily recurring templates.
//!
//! Re-running for the same date is a no-op: an instance is only created when
//! none with the same parent and due date exists. New instances are written
//! in one batch so an aborted run leaves nothing half-done. The store rejects
//! a second instance for the same parent and date, so overlapping runs that
//! both passed the existence check still create each instance once.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use super::{JobReport, ScheduledJob};
use crate::clock::app_weekday;
use crate::error::{JobError, StoreError};
use crate::models::task::{NewTask, Recurrence};
use crate::store::TaskStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecurringReport {
    pub templates: usize,
    pub due_today: usize,
    pub already_present: usize,
    pub failed_checks: usize,
    pub created: usize,
}

pub struct RecurringInstantiator {
    store: Arc<dyn TaskStore>,
}

impl RecurringInstantiator {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        RecurringInstantiator { store }
    }

    pub async fn instantiate(&self, today: NaiveDate) -> Result<RecurringReport, JobError> {
        let weekday = app_weekday(today);
        let templates = self.store.recurring_templates(Recurrence::Daily).await?;
        let mut report = RecurringReport {
            templates: templates.len(),
            ..Default::default()
        };

        let mut batch = Vec::new();
        for template in templates.iter().filter(|t| t.recurs_on(weekday)) {
            report.due_today += 1;
            match self.store.instance_exists(&template.id, today).await {
                Ok(true) => report.already_present += 1,
                Ok(false) => batch.push(NewTask::instance_of(template, today)),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(
                        "Skipping template {} for {}: existing-instance check failed: {}",
                        template.id, today, e
                    );
                    report.failed_checks += 1;
                }
            }
        }

        if batch.is_empty() {
            info!("No recurring instances to create for {}", today);
            return Ok(report);
        }
        match self.store.create_tasks(batch.clone()).await {
            Ok(created) => report.created = created.len(),
            Err(StoreError::Conflict(e)) => {
                warn!(
                    "Batch for {} overlaps instances written by another run ({}); inserting one by one",
                    today, e
                );
                self.create_each(batch, &mut report).await?;
            }
            Err(e) => return Err(e.into()),
        }
        info!("Created {} recurring task instances for {}", report.created, today);
        Ok(report)
    }

    // Fallback after a conflicting batch: instances that now exist count as present.
    async fn create_each(
        &self,
        batch: Vec<NewTask>,
        report: &mut RecurringReport,
    ) -> Result<(), JobError> {
        for new in batch {
            match self.store.create_task(new).await {
                Ok(_) => report.created += 1,
                Err(StoreError::Conflict(_)) => report.already_present += 1,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduledJob for RecurringInstantiator {
    fn name(&self) -> &'static str {
        "recurring-instantiator"
    }

    async fn run(&self, today: NaiveDate) -> Result<JobReport, JobError> {
        self.instantiate(today).await.map(JobReport::Recurring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{AuditStatus, Task, TaskStatus, TaskUpdate};
    use crate::store::{MemoryStore, ServerFilter, TaskQuery};
    use crate::testing::{date, new_task};
    use std::sync::atomic::{AtomicBool, Ordering};

    // 2024-01-10 was a Wednesday (code 2).
    const WEDNESDAY: &str = "2024-01-10";

    async fn template(store: &MemoryStore, assignee: &str, days: Vec<u8>) -> Task {
        let mut new = new_task(assignee, "2024-01-01");
        new.recurring = Recurrence::Daily;
        new.recurring_days = days;
        store.create_task(new).await.unwrap()
    }

    async fn instances(store: &MemoryStore) -> Vec<Task> {
        store
            .list_tasks(&TaskQuery::default())
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.parent_task_id.is_some())
            .collect()
    }

    #[tokio::test]
    async fn creates_instance_on_scheduled_weekday() {
        let store = Arc::new(MemoryStore::new());
        let tpl = template(&store, "u1", vec![2]).await;
        let job = RecurringInstantiator::new(store.clone());

        let report = job.instantiate(date(WEDNESDAY)).await.unwrap();
        assert_eq!(report.created, 1);

        let created = instances(&store).await;
        assert_eq!(created.len(), 1);
        let instance = &created[0];
        assert_eq!(instance.due_date, date(WEDNESDAY));
        assert_eq!(instance.start_date, Some(date(WEDNESDAY)));
        assert_eq!(instance.parent_task_id.as_deref(), Some(tpl.id.as_str()));
        assert_eq!(instance.status, TaskStatus::Pending);
        assert_eq!(instance.recurring, Recurrence::None);
        assert_eq!(instance.assigned_to_id, "u1");
    }

    #[tokio::test]
    async fn skips_templates_not_scheduled_today() {
        let store = Arc::new(MemoryStore::new());
        template(&store, "u1", vec![0, 4]).await;
        template(&store, "u2", vec![]).await;
        let job = RecurringInstantiator::new(store.clone());

        let report = job.instantiate(date(WEDNESDAY)).await.unwrap();
        assert_eq!(report.templates, 2);
        assert_eq!(report.due_today, 0);
        assert_eq!(report.created, 0);
        assert!(instances(&store).await.is_empty());
    }

    #[tokio::test]
    async fn running_twice_creates_no_duplicates() {
        let store = Arc::new(MemoryStore::new());
        template(&store, "u1", vec![2]).await;
        template(&store, "u2", vec![1, 2, 3]).await;
        let job = RecurringInstantiator::new(store.clone());

        let first = job.instantiate(date(WEDNESDAY)).await.unwrap();
        let after_first: Vec<_> = instances(&store).await.into_iter().map(|t| t.id).collect();
        let second = job.instantiate(date(WEDNESDAY)).await.unwrap();
        let after_second: Vec<_> = instances(&store).await.into_iter().map(|t| t.id).collect();

        assert_eq!(first.created, 2);
        assert_eq!(second.created, 0);
        assert_eq!(second.already_present, 2);
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn instances_are_never_templates() {
        let store = Arc::new(MemoryStore::new());
        template(&store, "u1", vec![2]).await;
        let job = RecurringInstantiator::new(store.clone());
        job.instantiate(date(WEDNESDAY)).await.unwrap();

        let templates = store.recurring_templates(Recurrence::Daily).await.unwrap();
        assert_eq!(templates.len(), 1);
        // A week later only the template spawns, not last week's instance.
        let report = job.instantiate(date("2024-01-17")).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(instances(&store).await.len(), 2);
    }

    /// Delegates to a memory store but fails chosen calls.
    struct FlakyStore {
        inner: MemoryStore,
        failing_parent: Option<String>,
        offline: AtomicBool,
        /// Yield after each existence check, letting a concurrent run interleave.
        slow_checks: bool,
    }

    #[async_trait]
    impl TaskStore for FlakyStore {
        async fn fetch_tasks(&self, filter: &ServerFilter) -> Result<Vec<Task>, StoreError> {
            self.inner.fetch_tasks(filter).await
        }
        async fn get_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
            self.inner.get_task(id).await
        }
        async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
            self.inner.create_task(new).await
        }
        async fn create_tasks(&self, batch: Vec<NewTask>) -> Result<Vec<Task>, StoreError> {
            self.inner.create_tasks(batch).await
        }
        async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<Task, StoreError> {
            self.inner.update_task(id, update).await
        }
        async fn set_audit_status(
            &self,
            id: &str,
            status: AuditStatus,
            by: &str,
        ) -> Result<Task, StoreError> {
            self.inner.set_audit_status(id, status, by).await
        }
        async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
            self.inner.delete_task(id).await
        }
        async fn recent_completed(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
            self.inner.recent_completed(limit).await
        }
        async fn attachment_audit_candidates(&self, limit: usize) -> Result<Vec<Task>, StoreError> {
            self.inner.attachment_audit_candidates(limit).await
        }
        async fn incomplete_tasks_for(
            &self,
            user_id: &str,
            limit: usize,
        ) -> Result<Vec<Task>, StoreError> {
            self.inner.incomplete_tasks_for(user_id, limit).await
        }
        async fn overdue_candidates(&self, today: NaiveDate) -> Result<Vec<Task>, StoreError> {
            self.inner.overdue_candidates(today).await
        }
        async fn tasks_due_on(
            &self,
            date: NaiveDate,
            statuses: &[TaskStatus],
        ) -> Result<Vec<Task>, StoreError> {
            self.inner.tasks_due_on(date, statuses).await
        }
        async fn recurring_templates(&self, r: Recurrence) -> Result<Vec<Task>, StoreError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".into()));
            }
            self.inner.recurring_templates(r).await
        }
        async fn instance_exists(&self, parent: &str, due: NaiveDate) -> Result<bool, StoreError> {
            if self.failing_parent.as_deref() == Some(parent) {
                return Err(StoreError::Query("index missing".into()));
            }
            let exists = self.inner.instance_exists(parent, due).await;
            if self.slow_checks {
                tokio::task::yield_now().await;
            }
            exists
        }
    }

    #[tokio::test]
    async fn failed_check_skips_only_that_template() {
        let inner = MemoryStore::new();
        let bad = template(&inner, "u1", vec![2]).await;
        template(&inner, "u2", vec![2]).await;
        let store = Arc::new(FlakyStore {
            inner,
            failing_parent: Some(bad.id.clone()),
            offline: AtomicBool::new(false),
            slow_checks: false,
        });
        let job = RecurringInstantiator::new(store.clone());

        let report = job.instantiate(date(WEDNESDAY)).await.unwrap();
        assert_eq!(report.failed_checks, 1);
        assert_eq!(report.created, 1);
        let created = store
            .list_tasks(&TaskQuery::default())
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.parent_task_id.is_some())
            .collect::<Vec<_>>();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].assigned_to_id, "u2");
    }

    #[tokio::test]
    async fn unreachable_store_aborts_without_writes() {
        let inner = MemoryStore::new();
        template(&inner, "u1", vec![2]).await;
        let store = Arc::new(FlakyStore {
            inner,
            failing_parent: None,
            offline: AtomicBool::new(true),
            slow_checks: false,
        });
        let job = RecurringInstantiator::new(store.clone());

        let err = job.instantiate(date(WEDNESDAY)).await.unwrap_err();
        assert!(matches!(err, JobError::Store(StoreError::Unavailable(_))));
        assert_eq!(store.list_tasks(&TaskQuery::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_runs_create_each_instance_once() {
        let inner = MemoryStore::new();
        template(&inner, "u1", vec![2]).await;
        let store = Arc::new(FlakyStore {
            inner,
            failing_parent: None,
            offline: AtomicBool::new(false),
            slow_checks: true,
        });
        let scheduled = RecurringInstantiator::new(store.clone());
        let manual = RecurringInstantiator::new(store.clone());

        let (a, b) = tokio::join!(
            scheduled.instantiate(date(WEDNESDAY)),
            manual.instantiate(date(WEDNESDAY))
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.created + b.created, 1);
        assert_eq!(a.already_present + b.already_present, 1);

        let created = store
            .list_tasks(&TaskQuery::default())
            .await
            .unwrap()
            .into_iter()
            .filter(|t| t.parent_task_id.is_some())
            .count();
        assert_eq!(created, 1);
    }
}
