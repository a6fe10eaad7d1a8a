//! The two daily jobs and the loop that triggers them.

pub mod recurring;
pub mod reminder;
pub mod schedule;

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::error::JobError;

pub use recurring::{RecurringInstantiator, RecurringReport};
pub use reminder::{ReminderDispatcher, ReminderReport};
pub use schedule::{run_daily, run_once, DailySchedule};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobReport {
    Recurring(RecurringReport),
    Reminder(ReminderReport),
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobReport::Recurring(r) => write!(
                f,
                "{} templates, {} due today, {} already present, {} failed checks, {} created",
                r.templates, r.due_today, r.already_present, r.failed_checks, r.created
            ),
            JobReport::Reminder(r) if r.skipped_unconfigured => {
                write!(f, "skipped: notifier not configured")
            }
            JobReport::Reminder(r) => write!(
                f,
                "{} recipients, {} sent, {} failed, {} without phone, {} invalid phone, {} unassigned tasks",
                r.recipients,
                r.sent,
                r.failed,
                r.skipped_no_phone,
                r.skipped_invalid_phone,
                r.skipped_unassigned
            ),
        }
    }
}

/// A unit of work run once per day for the organization's current date.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, today: NaiveDate) -> Result<JobReport, JobError>;
}
