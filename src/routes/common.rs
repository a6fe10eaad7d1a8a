use actix_web::HttpResponse;
use chrono::NaiveDate;
use log::{error, info};
use serde::Serialize;

use crate::clock::calendar_date;
use crate::error::StoreError;

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

pub fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(MessageResponse {
        success: false,
        message: message.into(),
    })
}

pub fn not_found(message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(MessageResponse {
        success: false,
        message: message.into(),
    })
}

pub fn ok_message(message: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        success: true,
        message: message.into(),
    })
}

/// Maps a store failure to a response, logging it with `context`.
pub fn store_failure(context: &str, e: StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(what) => {
            info!("{}: {} not found", context, what);
            not_found(format!("{} not found", what))
        }
        StoreError::Conflict(_) => {
            info!("{}: {}", context, e);
            HttpResponse::Conflict().json(MessageResponse {
                success: false,
                message: "Conflicts with an existing record".into(),
            })
        }
        StoreError::Unavailable(_) => {
            error!("{}: {}", context, e);
            HttpResponse::ServiceUnavailable().json(MessageResponse {
                success: false,
                message: "Store unavailable".into(),
            })
        }
        other => {
            error!("{}: {}", context, other);
            HttpResponse::InternalServerError().json(MessageResponse {
                success: false,
                message: format!("Failed to {}", context),
            })
        }
    }
}

/// Request dates may carry a time suffix; anything else unparseable is rejected.
pub fn parse_request_date(field: &str, raw: &str) -> Result<NaiveDate, HttpResponse> {
    calendar_date(raw).ok_or_else(|| bad_request(format!("Invalid {}: `{}`", field, raw)))
}
