//! Snapshot builders shared by unit tests.

use chrono::{NaiveDate, Utc};

use crate::clock::calendar_date;
use crate::models::absence::Absence;
use crate::models::holiday::Holiday;
use crate::models::task::{NewTask, Task, TaskStatus};
use crate::models::user::{User, UserRole};

pub fn date(s: &str) -> NaiveDate {
    calendar_date(s).expect("test date")
}

pub fn new_task(assignee: &str, due: &str) -> NewTask {
    NewTask {
        title: format!("Task for {assignee}"),
        description: String::new(),
        start_date: None,
        due_date: date(due),
        priority: Default::default(),
        status: TaskStatus::Pending,
        recurring: Default::default(),
        recurring_days: Vec::new(),
        attachment_required: false,
        attachment_type: None,
        attachment_description: None,
        assigned_to_id: assignee.to_string(),
        assigned_to_name: assignee.to_string(),
        assigned_to_city: None,
        assigned_by_id: "owner".to_string(),
        assigned_by_name: "Owner".to_string(),
        parent_task_id: None,
        is_holiday: false,
    }
}

pub fn task(id: &str, assignee: &str, due: &str, status: TaskStatus) -> Task {
    let mut new = new_task(assignee, due);
    new.status = status;
    Task::from_new(id.to_string(), new, Utc::now())
}

pub fn holiday(d: &str) -> Holiday {
    Holiday {
        id: format!("h-{d}"),
        date: date(d),
        name: "Holiday".into(),
        created_at: Utc::now(),
    }
}

pub fn absence(user_id: &str, from: &str, to: &str) -> Absence {
    Absence {
        id: format!("a-{user_id}-{from}"),
        user_id: user_id.into(),
        user_name: user_id.into(),
        from_date: date(from),
        to_date: date(to),
        reason: None,
        created_at: Utc::now(),
    }
}

pub fn user(id: &str, name: &str, city: Option<&str>) -> User {
    User {
        id: id.into(),
        name: name.into(),
        email: format!("{id}@example.com"),
        role: UserRole::Doer,
        phone: None,
        city: city.map(str::to_string),
        password_hash: String::new(),
        approved: true,
        created_at: None,
    }
}
