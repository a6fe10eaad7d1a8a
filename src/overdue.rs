//! Red Zone: incomplete work past its due date.
//!
//! Unlike KPI, no holiday or absence exclusion applies here.

use chrono::NaiveDate;
use serde::Serialize;

use crate::clock::days_between;
use crate::models::task::Task;
use crate::models::user::{User, UserRole};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueTask {
    #[serde(flatten)]
    pub task: Task,
    pub days_overdue: i64,
}

/// Pending/overdue tasks due strictly before `today`, oldest due date first.
pub fn get_overdue_tasks(
    tasks: &[Task],
    today: NaiveDate,
    assigned_to_id: Option<&str>,
) -> Vec<OverdueTask> {
    let mut overdue: Vec<OverdueTask> = tasks
        .iter()
        .filter(|t| t.is_open_overdue(today))
        .filter(|t| assigned_to_id.map_or(true, |id| t.assigned_to_id == id))
        .map(|t| OverdueTask {
            task: t.clone(),
            days_overdue: days_between(t.due_date, today),
        })
        .collect();
    overdue.sort_by_key(|o| o.task.due_date);
    overdue
}

/// Assignee restriction for a viewer: `None` means every task is visible,
/// `Some(id)` limits to that assignee. Auditors get no Red Zone at all.
pub fn red_zone_scope(viewer: &User) -> Option<Option<&str>> {
    match viewer.role {
        role if role.sees_team() => Some(None),
        UserRole::Doer => Some(Some(viewer.id.as_str())),
        _ => None,
    }
}
