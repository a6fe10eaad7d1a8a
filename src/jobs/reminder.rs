//! Daily digest of tasks due today, one message per assignee.
//!
//! Failures are isolated per recipient. There is no idempotency token, so a
//! re-run for the same day sends the digests again.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info, warn};
use serde::Serialize;

use super::{JobReport, ScheduledJob};
use crate::error::JobError;
use crate::models::task::{Task, TaskStatus};
use crate::notifier::Notifier;
use crate::phone;
use crate::store::Store;

pub const NO_TASKS_DUE: &str = "No tasks due today.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub skipped_unconfigured: bool,
    pub recipients: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped_no_phone: usize,
    pub skipped_invalid_phone: usize,
    /// Tasks due today with no assignee.
    pub skipped_unassigned: usize,
}

pub struct ReminderDispatcher {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    template: String,
}

impl ReminderDispatcher {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, template: String) -> Self {
        ReminderDispatcher {
            store,
            notifier,
            template,
        }
    }

    pub async fn dispatch(&self, today: NaiveDate) -> Result<ReminderReport, JobError> {
        let mut report = ReminderReport::default();
        if !self.notifier.is_configured() {
            warn!("Notifier auth token not set; skipping daily reminders for {}", today);
            report.skipped_unconfigured = true;
            return Ok(report);
        }

        let tasks = self
            .store
            .tasks_due_on(today, &TaskStatus::REMINDABLE)
            .await?;
        let mut by_assignee: BTreeMap<&str, Vec<&Task>> = BTreeMap::new();
        for task in &tasks {
            if task.assigned_to_id.is_empty() {
                info!("Task {} due {} has no assignee; skipping", task.id, today);
                report.skipped_unassigned += 1;
                continue;
            }
            by_assignee
                .entry(task.assigned_to_id.as_str())
                .or_default()
                .push(task);
        }
        if by_assignee.is_empty() {
            info!("No tasks due on {}; nothing to send", today);
            return Ok(report);
        }

        let phones: HashMap<String, Option<String>> = self
            .store
            .list_users()
            .await?
            .into_iter()
            .map(|u| (u.id, u.phone))
            .collect();
        let today_param = today.to_string();

        for (user_id, tasks) in by_assignee {
            report.recipients += 1;
            let raw_phone = match phones.get(user_id).and_then(|p| p.as_deref()) {
                Some(p) => p,
                None => {
                    info!("No phone for user {}; skipping", user_id);
                    report.skipped_no_phone += 1;
                    continue;
                }
            };
            let phone = phone::normalize(raw_phone);
            if phone.is_empty() {
                info!("Phone `{}` for user {} has no digits; skipping", raw_phone, user_id);
                report.skipped_invalid_phone += 1;
                continue;
            }

            let params = [today_param.clone(), digest(&tasks)];
            match self.notifier.send_template(&phone, &self.template, &params).await {
                Ok(()) => {
                    info!("Daily reminder sent to {}", phone);
                    report.sent += 1;
                }
                Err(e) => {
                    error!("Failed to send daily reminder to {}: {}", phone, e);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}

/// One `"<title> (Due: <date>, <priority>)"` line per task.
pub fn digest(tasks: &[&Task]) -> String {
    if tasks.is_empty() {
        return NO_TASKS_DUE.to_string();
    }
    tasks
        .iter()
        .map(|t| format!("{} (Due: {}, {})", t.title, t.due_date, t.priority))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ScheduledJob for ReminderDispatcher {
    fn name(&self) -> &'static str {
        "reminder-dispatcher"
    }

    async fn run(&self, today: NaiveDate) -> Result<JobReport, JobError> {
        self.dispatch(today).await.map(JobReport::Reminder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifierError;
    use crate::models::task::Priority;
    use crate::models::user::{NewUser, UserRole};
    use crate::store::{MemoryStore, TaskStore, UserStore};
    use crate::testing::{date, new_task, task};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        configured: bool,
        fail_for: Option<String>,
        sent: Mutex<Vec<(String, String, Vec<String>)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn send_template(
            &self,
            phone: &str,
            template: &str,
            params: &[String],
        ) -> Result<(), NotifierError> {
            if self.fail_for.as_deref() == Some(phone) {
                return Err(NotifierError::Rejected {
                    status: 500,
                    body: "upstream down".into(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((phone.to_string(), template.to_string(), params.to_vec()));
            Ok(())
        }
    }

    async fn member(store: &MemoryStore, name: &str, phone: Option<&str>) -> String {
        store
            .create_user(NewUser {
                name: name.into(),
                email: format!("{name}@example.com"),
                role: UserRole::Doer,
                phone: phone.map(str::to_string),
                city: None,
                password_hash: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    fn dispatcher(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> ReminderDispatcher {
        ReminderDispatcher::new(store, notifier, "daily_tasks_reminder".into())
    }

    const TODAY: &str = "2024-03-10";

    #[tokio::test]
    async fn sends_one_digest_and_skips_member_without_phone() {
        let store = Arc::new(MemoryStore::new());
        let with_phone = member(&store, "asha", Some("9876543210")).await;
        let without_phone = member(&store, "bilal", None).await;
        let mut a = new_task(&with_phone, TODAY);
        a.title = "Stock count".into();
        a.priority = Priority::High;
        store.create_task(a).await.unwrap();
        store.create_task(new_task(&without_phone, TODAY)).await.unwrap();

        let notifier = Arc::new(RecordingNotifier {
            configured: true,
            ..Default::default()
        });
        let report = dispatcher(store, notifier.clone())
            .dispatch(date(TODAY))
            .await
            .unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.skipped_no_phone, 1);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "919876543210");
        assert_eq!(sent[0].1, "daily_tasks_reminder");
        assert_eq!(
            sent[0].2,
            vec![TODAY.to_string(), "Stock count (Due: 2024-03-10, high)".to_string()]
        );
    }

    #[tokio::test]
    async fn send_failure_is_isolated() {
        let store = Arc::new(MemoryStore::new());
        let first = member(&store, "asha", Some("9876543210")).await;
        let second = member(&store, "bilal", Some("+91 91234 56789")).await;
        store.create_task(new_task(&first, TODAY)).await.unwrap();
        store.create_task(new_task(&second, TODAY)).await.unwrap();

        let notifier = Arc::new(RecordingNotifier {
            configured: true,
            fail_for: Some("919876543210".into()),
            ..Default::default()
        });
        let report = dispatcher(store, notifier.clone())
            .dispatch(date(TODAY))
            .await
            .unwrap();

        assert_eq!(report.recipients, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(notifier.sent.lock().unwrap()[0].0, "919123456789");
    }

    #[tokio::test]
    async fn groups_tasks_per_assignee_and_filters_status_and_date() {
        let store = Arc::new(MemoryStore::new());
        let id = member(&store, "asha", Some("9876543210")).await;
        let mut a = new_task(&id, TODAY);
        a.title = "A".into();
        let mut b = new_task(&id, TODAY);
        b.title = "B".into();
        b.status = TaskStatus::InProgress;
        let mut done = new_task(&id, TODAY);
        done.status = TaskStatus::Completed;
        let tomorrow = new_task(&id, "2024-03-11");
        let unassigned = new_task("", TODAY);
        for t in [a, b, done, tomorrow, unassigned] {
            store.create_task(t).await.unwrap();
        }

        let notifier = Arc::new(RecordingNotifier {
            configured: true,
            ..Default::default()
        });
        let report = dispatcher(store, notifier.clone())
            .dispatch(date(TODAY))
            .await
            .unwrap();

        assert_eq!(report.sent, 1);
        assert_eq!(report.skipped_unassigned, 1);
        let sent = notifier.sent.lock().unwrap();
        let lines: Vec<&str> = sent[0].2[1].lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.contains(&"A (Due: 2024-03-10, medium)"));
        assert!(lines.contains(&"B (Due: 2024-03-10, medium)"));
    }

    #[tokio::test]
    async fn phone_without_digits_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let id = member(&store, "asha", Some("not available")).await;
        store.create_task(new_task(&id, TODAY)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier {
            configured: true,
            ..Default::default()
        });
        let report = dispatcher(store, notifier.clone())
            .dispatch(date(TODAY))
            .await
            .unwrap();
        assert_eq!(report.skipped_invalid_phone, 1);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_token_skips_whole_run() {
        let store = Arc::new(MemoryStore::new());
        let id = member(&store, "asha", Some("9876543210")).await;
        store.create_task(new_task(&id, TODAY)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let report = dispatcher(store, notifier.clone())
            .dispatch(date(TODAY))
            .await
            .unwrap();
        assert!(report.skipped_unconfigured);
        assert_eq!(report.recipients, 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn digest_lines_and_empty_sentinel() {
        let a = task("a", "u1", TODAY, TaskStatus::Pending);
        let mut b = task("b", "u1", TODAY, TaskStatus::Pending);
        b.title = "Call vendor".into();
        b.priority = Priority::Urgent;
        assert_eq!(
            digest(&[&a, &b]),
            "Task for u1 (Due: 2024-03-10, medium)\nCall vendor (Due: 2024-03-10, urgent)"
        );
        assert_eq!(digest(&[]), NO_TASKS_DUE);
    }
}
