use actix_web::{web, HttpResponse, Responder};
use log::info;

use super::calendar_models::{
    AbsenceListResponse, AbsenceResponse, CreateAbsenceRequest, CreateHolidayRequest,
    HolidayListResponse, HolidayResponse,
};
use crate::models::absence::NewAbsence;
use crate::models::holiday::NewHoliday;
use crate::routes::common::{bad_request, ok_message, parse_request_date, store_failure};
use crate::state::AppState;
use crate::store::{CalendarStore, UserStore};

pub async fn list_holidays(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_holidays().await {
        Ok(holidays) => HttpResponse::Ok().json(HolidayListResponse { holidays }),
        Err(e) => store_failure("list holidays", e),
    }
}

pub async fn add_holiday(
    state: web::Data<AppState>,
    req: web::Json<CreateHolidayRequest>,
) -> impl Responder {
    let date = match parse_request_date("date", &req.date) {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    if req.name.trim().is_empty() {
        return bad_request("Holiday name is required");
    }
    let new = NewHoliday {
        date,
        name: req.name.trim().to_string(),
    };
    match state.store.add_holiday(new).await {
        Ok(holiday) => {
            info!("Holiday {} added on {}", holiday.name, holiday.date);
            HttpResponse::Ok().json(HolidayResponse {
                success: true,
                message: "Holiday added".into(),
                holiday: Some(holiday),
            })
        }
        Err(e) => store_failure("add holiday", e),
    }
}

pub async fn delete_holiday(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.store.delete_holiday(&id).await {
        Ok(()) => ok_message("Holiday deleted"),
        Err(e) => store_failure("delete holiday", e),
    }
}

pub async fn list_absences(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_absences().await {
        Ok(absences) => HttpResponse::Ok().json(AbsenceListResponse { absences }),
        Err(e) => store_failure("list absences", e),
    }
}

pub async fn add_absence(
    state: web::Data<AppState>,
    req: web::Json<CreateAbsenceRequest>,
) -> impl Responder {
    let req = req.into_inner();
    let from_date = match parse_request_date("from_date", &req.from_date) {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    let to_date = match parse_request_date("to_date", &req.to_date) {
        Ok(date) => date,
        Err(resp) => return resp,
    };
    if from_date > to_date {
        return bad_request("from_date must not be after to_date");
    }

    let user = match state.store.get_user(&req.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return bad_request("Unknown user"),
        Err(e) => return store_failure("look up user", e),
    };
    let new = NewAbsence {
        user_id: user.id,
        user_name: user.name,
        from_date,
        to_date,
        reason: req.reason.filter(|r| !r.trim().is_empty()),
    };
    match state.store.add_absence(new).await {
        Ok(absence) => {
            info!(
                "Absence for {} from {} to {} recorded",
                absence.user_id, absence.from_date, absence.to_date
            );
            HttpResponse::Ok().json(AbsenceResponse {
                success: true,
                message: "Absence recorded".into(),
                absence: Some(absence),
            })
        }
        Err(e) => store_failure("add absence", e),
    }
}
