use actix_web::{web, HttpResponse, Responder};
use log::{error, info};

use super::admin_models::JobRunResponse;
use crate::error::{JobError, StoreError};
use crate::jobs::{run_once, ScheduledJob};
use crate::state::AppState;

async fn trigger(state: &AppState, job: &dyn ScheduledJob) -> HttpResponse {
    let today = state.today();
    info!("Manual run of {} for {}", job.name(), today);

    match run_once(job, today, state.config.job_timeout).await {
        Ok(report) => {
            info!("{} finished for {}: {}", job.name(), today, report);
            HttpResponse::Ok().json(JobRunResponse {
                success: true,
                message: report.to_string(),
                job: job.name().into(),
                as_of: today.to_string(),
                report: Some(report),
            })
        }
        Err(e) => {
            error!("{} failed for {}: {}", job.name(), today, e);
            let body = JobRunResponse {
                success: false,
                message: e.to_string(),
                job: job.name().into(),
                as_of: today.to_string(),
                report: None,
            };
            match e {
                JobError::Store(StoreError::Unavailable(_)) => {
                    HttpResponse::ServiceUnavailable().json(body)
                }
                JobError::TimedOut(_) => HttpResponse::GatewayTimeout().json(body),
                _ => HttpResponse::InternalServerError().json(body),
            }
        }
    }
}

// Safe to repeat: instances are only created when missing.
pub async fn run_recurring(state: web::Data<AppState>) -> impl Responder {
    trigger(&state, state.recurring.as_ref()).await
}

// Repeating this sends the digest again.
pub async fn run_reminders(state: web::Data<AppState>) -> impl Responder {
    trigger(&state, state.reminders.as_ref()).await
}
