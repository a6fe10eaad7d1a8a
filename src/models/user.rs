use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

string_enum! {
    pub enum UserRole {
        Owner => "owner",
        Manager => "manager",
        Doer => "doer",
        Auditor => "auditor",
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Doer
    }
}

impl UserRole {
    /// Owners and managers see the whole team; doers only their own work.
    pub fn sees_team(&self) -> bool {
        matches!(self, UserRole::Owner | UserRole::Manager)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub city: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub approved: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, FromRow)]
pub struct UserRecord {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub password_hash: Option<String>,
    pub approved: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        User {
            id: r.id,
            name: r.name.unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            role: r
                .role
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            phone: r.phone.filter(|p| !p.trim().is_empty()),
            city: r.city,
            password_hash: r.password_hash.unwrap_or_default(),
            approved: r.approved.unwrap_or(false),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub approved: Option<bool>,
}

impl User {
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone).filter(|p| !p.trim().is_empty());
        }
        if let Some(city) = update.city {
            self.city = Some(city);
        }
        if let Some(approved) = update.approved {
            self.approved = approved;
        }
    }
}

/// Emails are matched case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User::from(UserRecord {
            id: "u1".into(),
            name: Some("Asha".into()),
            password_hash: Some("$2b$secret".into()),
            ..Default::default()
        });
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "doer");
    }

    #[test]
    fn blank_phone_update_clears_phone() {
        let mut user = User::from(UserRecord {
            id: "u1".into(),
            phone: Some("9876543210".into()),
            ..Default::default()
        });
        user.apply(UserUpdate {
            phone: Some(" ".into()),
            ..Default::default()
        });
        assert_eq!(user.phone, None);
        user.apply(UserUpdate {
            phone: Some("9123456780".into()),
            ..Default::default()
        });
        assert_eq!(user.phone.as_deref(), Some("9123456780"));
    }

    #[test]
    fn blank_phone_decodes_as_absent() {
        let user = User::from(UserRecord {
            id: "u1".into(),
            phone: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(user.phone, None);
    }
}
