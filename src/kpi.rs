//! Completion and lateness metrics over a task snapshot.
//!
//! Tasks due on a holiday, or on a day their assignee was on leave, are not
//! countable: they neither credit nor penalize anyone. All functions take the
//! as-of date explicitly so one aggregation sees a single "today".

use chrono::NaiveDate;
use serde::Serialize;

use crate::attendance::is_countable;
use crate::models::absence::Absence;
use crate::models::holiday::Holiday;
use crate::models::task::{Task, TaskStatus};
use crate::models::user::User;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KpiMetrics {
    pub total_assigned: usize,
    pub on_time_completed: usize,
    pub late_completed: usize,
    pub overdue_count: usize,
    pub overdue_percent: u32,
    pub late_completion_percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberKpiRow {
    pub user_id: String,
    pub user_name: String,
    pub city: Option<String>,
    #[serde(flatten)]
    pub metrics: KpiMetrics,
}

/// Team-wide metrics, or one member's when `user_id` is given.
pub fn compute_kpi(
    tasks: &[Task],
    holidays: &[Holiday],
    absences: &[Absence],
    user_id: Option<&str>,
    today: NaiveDate,
) -> KpiMetrics {
    let selected = tasks
        .iter()
        .filter(|t| user_id.map_or(true, |id| t.assigned_to_id == id));
    tally(selected, holidays, absences, today)
}

/// One row per user, busiest first. Users with equal load keep input order.
pub fn compute_kpi_by_member(
    tasks: &[Task],
    holidays: &[Holiday],
    absences: &[Absence],
    users: &[User],
    today: NaiveDate,
) -> Vec<MemberKpiRow> {
    let mut rows: Vec<MemberKpiRow> = users
        .iter()
        .map(|u| MemberKpiRow {
            user_id: u.id.clone(),
            user_name: u.name.clone(),
            city: u.city.clone(),
            metrics: compute_kpi(tasks, holidays, absences, Some(&u.id), today),
        })
        .collect();
    rows.sort_by(|a, b| b.metrics.total_assigned.cmp(&a.metrics.total_assigned));
    rows
}

fn tally<'a>(
    tasks: impl Iterator<Item = &'a Task>,
    holidays: &[Holiday],
    absences: &[Absence],
    today: NaiveDate,
) -> KpiMetrics {
    let mut m = KpiMetrics::default();
    for task in tasks.filter(|t| is_countable(t, holidays, absences)) {
        m.total_assigned += 1;
        if task.status == TaskStatus::Completed {
            // Completed without a completion time counts toward the total only.
            match task.completed_on() {
                Some(done) if done <= task.due_date => m.on_time_completed += 1,
                Some(_) => m.late_completed += 1,
                None => {}
            }
        } else if task.is_open_overdue(today) {
            m.overdue_count += 1;
        }
    }
    m.late_completion_percent =
        rounded_percent(m.late_completed, m.on_time_completed + m.late_completed);
    m.overdue_percent = rounded_percent(m.overdue_count, m.total_assigned);
    m
}

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is 0.
fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}
