use serde::{Deserialize, Serialize};

use crate::models::absence::Absence;
use crate::models::holiday::Holiday;

#[derive(Deserialize)]
pub struct CreateHolidayRequest {
    pub date: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateAbsenceRequest {
    pub user_id: String,
    pub from_date: String,
    pub to_date: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct HolidayListResponse {
    pub holidays: Vec<Holiday>,
}

#[derive(Serialize)]
pub struct HolidayResponse {
    pub success: bool,
    pub message: String,
    pub holiday: Option<Holiday>,
}

#[derive(Serialize)]
pub struct AbsenceListResponse {
    pub absences: Vec<Absence>,
}

#[derive(Serialize)]
pub struct AbsenceResponse {
    pub success: bool,
    pub message: String,
    pub absence: Option<Absence>,
}
