use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A member's leave, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Absence {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Absence {
    pub fn covers(&self, user_id: &str, date: NaiveDate) -> bool {
        self.user_id == user_id && self.from_date <= date && date <= self.to_date
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAbsence {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}
