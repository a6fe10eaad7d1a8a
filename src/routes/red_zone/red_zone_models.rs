use serde::{Deserialize, Serialize};

use crate::overdue::OverdueTask;

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RedZoneQuery {
    pub viewer_id: Option<String>,
}

#[derive(Serialize)]
pub struct RedZoneResponse {
    pub as_of: String,
    pub tasks: Vec<OverdueTask>,
}
