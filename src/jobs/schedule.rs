use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use log::{error, info};

use super::ScheduledJob;
use crate::clock::org_today;
use crate::error::JobError;

/// A fixed local wall-clock time, every day, in the organization's zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySchedule {
    pub at: NaiveTime,
    pub tz: Tz,
}

impl DailySchedule {
    pub fn new(at: NaiveTime, tz: Tz) -> Self {
        DailySchedule { at, tz }
    }

    /// First run instant strictly after `now`. Ambiguous local times resolve to
    /// the earlier instant; local times skipped by a DST jump move to the next day.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_today = now.with_timezone(&self.tz).date_naive();
        for offset in 0..=2 {
            let Some(date) = local_today.checked_add_days(Days::new(offset)) else {
                break;
            };
            if let Some(at) = self.tz.from_local_datetime(&date.and_time(self.at)).earliest() {
                let at = at.with_timezone(&Utc);
                if at > now {
                    return at;
                }
            }
        }
        now + chrono::Duration::days(1)
    }
}

/// Runs `job` once a day forever. Each invocation is bounded by `timeout`;
/// errors are logged and the next tick is the only retry.
pub async fn run_daily(job: Arc<dyn ScheduledJob>, schedule: DailySchedule, timeout: Duration) {
    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        info!(
            "Next {} run at {}",
            job.name(),
            next.with_timezone(&schedule.tz)
        );
        tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

        let today = org_today(Utc::now(), schedule.tz);
        match run_once(job.as_ref(), today, timeout).await {
            Ok(report) => info!("{} finished for {}: {}", job.name(), today, report),
            Err(e) => error!("{} failed for {}: {}", job.name(), today, e),
        }
    }
}

/// One bounded invocation, shared by the daily loop and manual triggers.
pub async fn run_once(
    job: &dyn ScheduledJob,
    today: chrono::NaiveDate,
    timeout: Duration,
) -> Result<super::JobReport, JobError> {
    match tokio::time::timeout(timeout, job.run(today)).await {
        Ok(result) => result,
        Err(_) => Err(JobError::TimedOut(job.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobReport, RecurringReport};
    use async_trait::async_trait;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn next_run_later_today_in_org_zone() {
        // 08:00 IST is 02:30 UTC.
        let schedule = DailySchedule::new(at(8, 0), chrono_tz::Asia::Kolkata);
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(now),
            Utc.with_ymd_and_hms(2024, 3, 10, 2, 30, 0).unwrap()
        );
    }

    #[test]
    fn next_run_rolls_to_tomorrow_once_passed() {
        let schedule = DailySchedule::new(at(8, 0), chrono_tz::Asia::Kolkata);
        let exactly = Utc.with_ymd_and_hms(2024, 3, 10, 2, 30, 0).unwrap();
        assert_eq!(
            schedule.next_after(exactly),
            Utc.with_ymd_and_hms(2024, 3, 11, 2, 30, 0).unwrap()
        );
    }

    #[test]
    fn skipped_local_time_moves_to_next_day() {
        // 02:30 did not exist in Berlin on 2024-03-31.
        let schedule = DailySchedule::new(at(2, 30), chrono_tz::Europe::Berlin);
        let now = Utc.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(now),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 30, 0).unwrap()
        );
    }

    struct SlowJob;

    #[async_trait]
    impl ScheduledJob for SlowJob {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn run(&self, _today: NaiveDate) -> Result<JobReport, JobError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(JobReport::Recurring(RecurringReport::default()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn run_is_bounded_by_timeout() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let result = run_once(&SlowJob, today, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(JobError::TimedOut("slow"))));
    }
}
