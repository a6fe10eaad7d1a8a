use serde::{Deserialize, Serialize};

use crate::kpi::{KpiMetrics, MemberKpiRow};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct KpiQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct KpiResponse {
    pub as_of: String,
    pub metrics: KpiMetrics,
}

#[derive(Serialize)]
pub struct MemberKpiResponse {
    pub as_of: String,
    pub members: Vec<MemberKpiRow>,
}
