use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

string_enum! {
    pub enum Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

string_enum! {
    /// Stored status. `Overdue` is advisory: lateness is always recomputed
    /// from `due_date` against the as-of date (see [`Task::is_open_overdue`]).
    pub enum TaskStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Overdue => "overdue",
        Cancelled => "cancelled",
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Pending
    }
}

impl TaskStatus {
    /// Statuses that still count as "not done" for Red Zone and KPI overdue.
    pub const OPEN_OVERDUE: [TaskStatus; 2] = [TaskStatus::Pending, TaskStatus::Overdue];
    /// Statuses that receive a daily reminder.
    pub const REMINDABLE: [TaskStatus; 3] =
        [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Overdue];
}

string_enum! {
    /// Only `Daily` is materialized by the recurring job; the rest are labels.
    pub enum Recurrence {
        None => "none",
        Daily => "daily",
        Weekly => "weekly",
        Fortnightly => "fortnightly",
        Monthly => "monthly",
        Quarterly => "quarterly",
        HalfYearly => "half_yearly",
        Yearly => "yearly",
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Recurrence::None
    }
}

string_enum! {
    pub enum AttachmentType {
        Media => "media",
        Text => "text",
    }
}

string_enum! {
    pub enum AuditStatus {
        Pending => "pending",
        Audited => "audited",
        Bogus => "bogus",
        Unclear => "unclear",
    }
}

/// Weekday code, 0 = Monday .. 6 = Sunday.
pub type WeekdayCode = u8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    pub recurring: Recurrence,
    pub recurring_days: Vec<WeekdayCode>,
    pub attachment_required: bool,
    pub attachment_type: Option<AttachmentType>,
    pub attachment_description: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_text: Option<String>,
    pub assigned_to_id: String,
    pub assigned_to_name: String,
    pub assigned_to_city: Option<String>,
    pub assigned_by_id: String,
    pub assigned_by_name: String,
    pub parent_task_id: Option<String>,
    pub is_holiday: bool,
    pub audit_status: Option<AuditStatus>,
    pub audited_at: Option<DateTime<Utc>>,
    pub audited_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a stored task from a creation payload.
    pub fn from_new(id: String, new: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title: new.title,
            description: new.description,
            start_date: new.start_date,
            due_date: new.due_date,
            priority: new.priority,
            status: new.status,
            recurring: new.recurring,
            recurring_days: new.recurring_days,
            attachment_required: new.attachment_required,
            attachment_type: new.attachment_type,
            attachment_description: new.attachment_description,
            attachment_url: None,
            attachment_text: None,
            assigned_to_id: new.assigned_to_id,
            assigned_to_name: new.assigned_to_name,
            assigned_to_city: new.assigned_to_city,
            assigned_by_id: new.assigned_by_id,
            assigned_by_name: new.assigned_by_name,
            parent_task_id: new.parent_task_id,
            is_holiday: new.is_holiday,
            audit_status: None,
            audited_at: None,
            audited_by: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Not completed and past due as of `today`.
    pub fn is_open_overdue(&self, today: NaiveDate) -> bool {
        TaskStatus::OPEN_OVERDUE.contains(&self.status) && self.due_date < today
    }

    /// A daily template scheduled for the given weekday.
    pub fn recurs_on(&self, weekday: WeekdayCode) -> bool {
        self.recurring == Recurrence::Daily
            && self.parent_task_id.is_none()
            && self.recurring_days.contains(&weekday)
    }

    /// Calendar date (UTC) the task was completed on.
    pub fn completed_on(&self) -> Option<NaiveDate> {
        self.completed_at.map(|at| at.date_naive())
    }

    /// Applies a partial update. Setting `completed_at` always marks the task completed.
    pub fn apply(&mut self, update: TaskUpdate, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = Some(start_date);
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(recurring) = update.recurring {
            self.recurring = recurring;
        }
        if let Some(days) = update.recurring_days {
            self.recurring_days = normalize_weekdays(days);
        }
        if let Some(required) = update.attachment_required {
            self.attachment_required = required;
        }
        if let Some(kind) = update.attachment_type {
            self.attachment_type = Some(kind);
        }
        if let Some(desc) = update.attachment_description {
            self.attachment_description = Some(desc);
        }
        if let Some(url) = update.attachment_url {
            self.attachment_url = Some(url);
        }
        if let Some(text) = update.attachment_text {
            self.attachment_text = Some(text);
        }
        if let Some(id) = update.assigned_to_id {
            self.assigned_to_id = id;
        }
        if let Some(name) = update.assigned_to_name {
            self.assigned_to_name = name;
        }
        if let Some(city) = update.assigned_to_city {
            self.assigned_to_city = Some(city);
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
            self.status = TaskStatus::Completed;
        }
        self.updated_at = now;
    }
}

/// Payload for creating a task; the store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
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
    #[serde(default)]
    pub assigned_to_name: String,
    #[serde(default)]
    pub assigned_to_city: Option<String>,
    pub assigned_by_id: String,
    #[serde(default)]
    pub assigned_by_name: String,
    #[serde(default)]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub is_holiday: bool,
}

impl NewTask {
    /// A dated, non-recurring instance of a daily template.
    pub fn instance_of(template: &Task, today: NaiveDate) -> Self {
        NewTask {
            title: template.title.clone(),
            description: template.description.clone(),
            start_date: Some(today),
            due_date: today,
            priority: template.priority,
            status: TaskStatus::Pending,
            recurring: Recurrence::None,
            recurring_days: Vec::new(),
            attachment_required: template.attachment_required,
            attachment_type: template.attachment_type,
            attachment_description: template.attachment_description.clone(),
            assigned_to_id: template.assigned_to_id.clone(),
            assigned_to_name: template.assigned_to_name.clone(),
            assigned_to_city: template.assigned_to_city.clone(),
            assigned_by_id: template.assigned_by_id.clone(),
            assigned_by_name: template.assigned_by_name.clone(),
            parent_task_id: Some(template.id.clone()),
            is_holiday: false,
        }
    }
}

/// Partial update of a task. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub recurring: Option<Recurrence>,
    pub recurring_days: Option<Vec<WeekdayCode>>,
    pub attachment_required: Option<bool>,
    pub attachment_type: Option<AttachmentType>,
    pub attachment_description: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_text: Option<String>,
    pub assigned_to_id: Option<String>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_city: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Loosely typed task row as read from the store. Every column may be
/// missing or hold an unknown spelling; [`decode_tasks`] resolves defaults.
#[derive(Debug, Clone, Default, FromRow)]
pub struct TaskRecord {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub recurring: Option<String>,
    pub recurring_days: Option<String>,
    pub attachment_required: Option<bool>,
    pub attachment_type: Option<String>,
    pub attachment_description: Option<String>,
    pub attachment_url: Option<String>,
    pub attachment_text: Option<String>,
    pub assigned_to_id: Option<String>,
    pub assigned_to_name: Option<String>,
    pub assigned_to_city: Option<String>,
    pub assigned_by_id: Option<String>,
    pub assigned_by_name: Option<String>,
    pub parent_task_id: Option<String>,
    pub is_holiday: Option<bool>,
    pub audit_status: Option<String>,
    pub audited_at: Option<DateTime<Utc>>,
    pub audited_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRecord> for Task {
    type Error = String;

    fn try_from(r: TaskRecord) -> Result<Self, Self::Error> {
        let due_date = r
            .due_date
            .ok_or_else(|| format!("task {} has no due_date", r.id))?;
        Ok(Task {
            title: r.title.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            start_date: r.start_date,
            due_date,
            priority: lenient(r.priority.as_deref()),
            status: lenient(r.status.as_deref()),
            recurring: lenient(r.recurring.as_deref()),
            recurring_days: r
                .recurring_days
                .as_deref()
                .map(parse_weekdays)
                .unwrap_or_default(),
            attachment_required: r.attachment_required.unwrap_or(false),
            attachment_type: r.attachment_type.as_deref().and_then(|s| s.parse().ok()),
            attachment_description: r.attachment_description,
            attachment_url: r.attachment_url,
            attachment_text: r.attachment_text,
            assigned_to_id: r.assigned_to_id.unwrap_or_default(),
            assigned_to_name: r.assigned_to_name.unwrap_or_default(),
            assigned_to_city: r.assigned_to_city,
            assigned_by_id: r.assigned_by_id.unwrap_or_default(),
            assigned_by_name: r.assigned_by_name.unwrap_or_default(),
            parent_task_id: r.parent_task_id.filter(|p| !p.is_empty()),
            is_holiday: r.is_holiday.unwrap_or(false),
            audit_status: r.audit_status.as_deref().and_then(|s| s.parse().ok()),
            audited_at: r.audited_at,
            audited_by: r.audited_by,
            created_at: r.created_at.unwrap_or_default(),
            updated_at: r.updated_at.unwrap_or_default(),
            completed_at: r.completed_at,
            id: r.id,
        })
    }
}

/// Decodes store rows, dropping (and logging) rows that cannot form a task.
pub fn decode_tasks(records: Vec<TaskRecord>) -> Vec<Task> {
    records
        .into_iter()
        .filter_map(|record| match Task::try_from(record) {
            Ok(task) => Some(task),
            Err(e) => {
                warn!("Skipping undecodable task row: {}", e);
                None
            }
        })
        .collect()
}

fn lenient<T: std::str::FromStr + Default>(raw: Option<&str>) -> T {
    raw.and_then(|s| s.parse().ok()).unwrap_or_default()
}

/// Parses a comma separated weekday list such as `"0,2,4"`.
pub fn parse_weekdays(raw: &str) -> Vec<WeekdayCode> {
    normalize_weekdays(
        raw.split(',')
            .filter_map(|part| part.trim().parse::<WeekdayCode>().ok())
            .collect(),
    )
}

pub fn format_weekdays(days: &[WeekdayCode]) -> String {
    days.iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn normalize_weekdays(mut days: Vec<WeekdayCode>) -> Vec<WeekdayCode> {
    days.retain(|d| *d <= 6);
    days.sort_unstable();
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> TaskRecord {
        TaskRecord {
            id: id.to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 5),
            ..Default::default()
        }
    }

    #[test]
    fn decode_applies_defaults() {
        let task = Task::try_from(record("t1")).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.recurring, Recurrence::None);
        assert!(!task.attachment_required);
        assert!(!task.is_holiday);
        assert_eq!(task.title, "");
        assert!(task.recurring_days.is_empty());
    }

    #[test]
    fn decode_falls_back_on_unknown_spellings() {
        let mut r = record("t1");
        r.priority = Some("critical".into());
        r.status = Some("done".into());
        r.recurring = Some("hourly".into());
        r.attachment_type = Some("video".into());
        let task = Task::try_from(r).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.recurring, Recurrence::None);
        assert_eq!(task.attachment_type, None);
    }

    #[test]
    fn decode_rejects_missing_due_date() {
        let mut r = record("t1");
        r.due_date = None;
        assert!(Task::try_from(r).is_err());
        let mut bad = record("t2");
        bad.due_date = None;
        let decoded = decode_tasks(vec![bad, record("t3")]);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "t3");
    }

    #[test]
    fn weekdays_are_parsed_sorted_and_bounded() {
        assert_eq!(parse_weekdays("4, 0,2,9,x,2"), vec![0, 2, 4]);
        assert_eq!(parse_weekdays(""), Vec::<u8>::new());
        assert_eq!(format_weekdays(&[0, 2, 4]), "0,2,4");
    }

    #[test]
    fn setting_completed_at_marks_completed() {
        let mut task = Task::try_from(record("t1")).unwrap();
        let now = Utc::now();
        task.apply(
            TaskUpdate {
                completed_at: Some(now),
                ..Default::default()
            },
            now,
        );
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(now));
        assert_eq!(task.updated_at, now);
    }

    #[test]
    fn instance_copies_template_and_is_not_recurring() {
        let mut r = record("tpl");
        r.recurring = Some("daily".into());
        r.recurring_days = Some("2".into());
        r.priority = Some("urgent".into());
        r.assigned_to_id = Some("u1".into());
        let template = Task::try_from(r).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let instance = NewTask::instance_of(&template, today);
        assert_eq!(instance.due_date, today);
        assert_eq!(instance.start_date, Some(today));
        assert_eq!(instance.recurring, Recurrence::None);
        assert_eq!(instance.status, TaskStatus::Pending);
        assert_eq!(instance.priority, Priority::Urgent);
        assert_eq!(instance.parent_task_id.as_deref(), Some("tpl"));
        assert_eq!(instance.assigned_to_id, "u1");
    }
}
