use chrono::NaiveDate;

use crate::clock::calendar_date;
use crate::models::absence::Absence;
use crate::models::holiday::Holiday;
use crate::models::task::Task;

pub fn is_holiday(date: NaiveDate, holidays: &[Holiday]) -> bool {
    holidays.iter().any(|h| h.date == date)
}

pub fn is_user_absent(user_id: &str, date: NaiveDate, absences: &[Absence]) -> bool {
    absences.iter().any(|a| a.covers(user_id, date))
}

/// Same as [`is_user_absent`] for a raw timestamp such as `2024-01-05T10:00:00Z`;
/// only the date portion is compared. Unparseable input is never "absent".
pub fn is_user_absent_at(user_id: &str, raw: &str, absences: &[Absence]) -> bool {
    calendar_date(raw)
        .map(|date| is_user_absent(user_id, date, absences))
        .unwrap_or(false)
}

/// Whether a task counts toward KPI: not a holiday (snapshot or current list)
/// and the assignee was not on leave on the due date.
pub fn is_countable(task: &Task, holidays: &[Holiday], absences: &[Absence]) -> bool {
    if task.is_holiday || is_holiday(task.due_date, holidays) {
        return false;
    }
    !is_user_absent(&task.assigned_to_id, task.due_date, absences)
}
