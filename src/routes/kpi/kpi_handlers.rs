use actix_web::{web, HttpResponse, Responder};
use log::info;

use super::kpi_models::{KpiQuery, KpiResponse, MemberKpiResponse};
use crate::error::StoreError;
use crate::kpi::{compute_kpi, compute_kpi_by_member};
use crate::models::absence::Absence;
use crate::models::holiday::Holiday;
use crate::models::task::Task;
use crate::routes::common::store_failure;
use crate::state::AppState;
use crate::store::{CalendarStore, TaskQuery, TaskStore, UserStore};

// One snapshot of everything the metrics read.
async fn snapshot(state: &AppState) -> Result<(Vec<Task>, Vec<Holiday>, Vec<Absence>), StoreError> {
    let tasks = state.store.list_tasks(&TaskQuery::default()).await?;
    let holidays = state.store.list_holidays().await?;
    let absences = state.store.list_absences().await?;
    Ok((tasks, holidays, absences))
}

pub async fn kpi(state: web::Data<AppState>, query: web::Query<KpiQuery>) -> impl Responder {
    let today = state.today();
    let (tasks, holidays, absences) = match snapshot(&state).await {
        Ok(snapshot) => snapshot,
        Err(e) => return store_failure("load KPI data", e),
    };
    let user_id = query.user_id.as_deref().filter(|id| !id.is_empty());
    info!("Computing KPI as of {} for {}", today, user_id.unwrap_or("team"));

    HttpResponse::Ok().json(KpiResponse {
        as_of: today.to_string(),
        metrics: compute_kpi(&tasks, &holidays, &absences, user_id, today),
    })
}

pub async fn member_kpi(state: web::Data<AppState>) -> impl Responder {
    let today = state.today();
    let (tasks, holidays, absences) = match snapshot(&state).await {
        Ok(snapshot) => snapshot,
        Err(e) => return store_failure("load KPI data", e),
    };
    let users = match state.store.list_users().await {
        Ok(users) => users,
        Err(e) => return store_failure("list users", e),
    };

    HttpResponse::Ok().json(MemberKpiResponse {
        as_of: today.to_string(),
        members: compute_kpi_by_member(&tasks, &holidays, &absences, &users, today),
    })
}
