use serde::Serialize;

use crate::jobs::JobReport;

#[derive(Serialize)]
pub struct JobRunResponse {
    pub success: bool,
    pub message: String,
    pub job: String,
    pub as_of: String,
    pub report: Option<JobReport>,
}
