use actix_web::{web, HttpResponse, Responder};
use log::info;

use super::red_zone_models::{RedZoneQuery, RedZoneResponse};
use crate::overdue::{get_overdue_tasks, red_zone_scope};
use crate::routes::common::{not_found, store_failure};
use crate::state::AppState;
use crate::store::{TaskStore, UserStore};

const RED_ZONE_LIMIT: usize = 50;

pub async fn red_zone(state: web::Data<AppState>, query: web::Query<RedZoneQuery>) -> impl Responder {
    let today = state.today();

    let viewer = match query.viewer_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => match state.store.get_user(id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => return not_found("Viewer not found"),
            Err(e) => return store_failure("look up viewer", e),
        },
        None => None,
    };
    let scope = match &viewer {
        Some(viewer) => red_zone_scope(viewer),
        None => Some(None),
    };
    let Some(assigned_to) = scope else {
        info!("Red Zone hidden for auditor {:?}", query.viewer_id);
        return HttpResponse::Ok().json(RedZoneResponse {
            as_of: today.to_string(),
            tasks: Vec::new(),
        });
    };

    match state
        .store
        .overdue_tasks(today, assigned_to, Some(RED_ZONE_LIMIT))
        .await
    {
        Ok(rows) => HttpResponse::Ok().json(RedZoneResponse {
            as_of: today.to_string(),
            tasks: get_overdue_tasks(&rows, today, assigned_to),
        }),
        Err(e) => store_failure("load overdue tasks", e),
    }
}
