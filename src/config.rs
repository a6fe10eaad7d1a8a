use std::env;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::error::ConfigError;

pub const DEFAULT_NOTIFIER_API_URL: &str = "https://app.11za.in/apis/template/sendTemplate";
pub const DEFAULT_ORIGIN_WEBSITE: &str = "https://whiterock.co.in/";

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub api_url: String,
    pub origin_website: String,
    /// Without a token nothing is ever sent.
    pub auth_token: Option<String>,
    pub template_task_assigned: String,
    pub template_daily: String,
    pub request_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        NotifierConfig {
            api_url: DEFAULT_NOTIFIER_API_URL.to_string(),
            origin_website: DEFAULT_ORIGIN_WEBSITE.to_string(),
            auth_token: None,
            template_task_assigned: "task_assigned".to_string(),
            template_daily: "daily_tasks_reminder".to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_address: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub timezone: Tz,
    pub recurring_run_at: NaiveTime,
    pub reminder_run_at: NaiveTime,
    pub job_timeout: Duration,
    pub app_base_url: String,
    pub notifier: NotifierConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            server_address: "0.0.0.0:8080".to_string(),
            database_url: None,
            database_max_connections: 5,
            timezone: chrono_tz::Asia::Kolkata,
            recurring_run_at: NaiveTime::from_hms_opt(5, 0, 0).unwrap_or_default(),
            reminder_run_at: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            job_timeout: Duration::from_secs(120),
            app_base_url: "http://localhost:5173".to_string(),
            notifier: NotifierConfig::default(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment (call `dotenv()` first to honor `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();
        let notifier_defaults = NotifierConfig::default();

        Ok(AppConfig {
            server_address: get("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            database_url: get("DATABASE_URL"),
            database_max_connections: match get("DATABASE_MAX_CONNECTIONS") {
                Some(v) => parse_number("DATABASE_MAX_CONNECTIONS", &v)?,
                None => defaults.database_max_connections,
            },
            timezone: match get("ORG_TIMEZONE") {
                Some(v) => v.parse::<Tz>().map_err(|e| ConfigError::Invalid {
                    key: "ORG_TIMEZONE",
                    value: v.clone(),
                    reason: e.to_string(),
                })?,
                None => defaults.timezone,
            },
            recurring_run_at: match get("RECURRING_RUN_AT") {
                Some(v) => parse_time("RECURRING_RUN_AT", &v)?,
                None => defaults.recurring_run_at,
            },
            reminder_run_at: match get("REMINDER_RUN_AT") {
                Some(v) => parse_time("REMINDER_RUN_AT", &v)?,
                None => defaults.reminder_run_at,
            },
            job_timeout: match get("JOB_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_number("JOB_TIMEOUT_SECS", &v)?),
                None => defaults.job_timeout,
            },
            app_base_url: get("APP_BASE_URL").unwrap_or(defaults.app_base_url),
            notifier: NotifierConfig {
                api_url: get("NOTIFIER_API_URL").unwrap_or(notifier_defaults.api_url),
                origin_website: get("NOTIFIER_ORIGIN_WEBSITE")
                    .unwrap_or(notifier_defaults.origin_website),
                auth_token: get("NOTIFIER_AUTH_TOKEN"),
                template_task_assigned: get("NOTIFIER_TEMPLATE_TASK_ASSIGNED")
                    .unwrap_or(notifier_defaults.template_task_assigned),
                template_daily: get("NOTIFIER_TEMPLATE_DAILY")
                    .unwrap_or(notifier_defaults.template_daily),
                request_timeout: match get("NOTIFIER_TIMEOUT_SECS") {
                    Some(v) => Duration::from_secs(parse_number("NOTIFIER_TIMEOUT_SECS", &v)?),
                    None => notifier_defaults.request_timeout,
                },
            },
        })
    }
}

fn parse_time(key: &'static str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server_address, "0.0.0.0:8080");
        assert_eq!(cfg.timezone, chrono_tz::Asia::Kolkata);
        assert_eq!(cfg.job_timeout, Duration::from_secs(120));
        assert_eq!(cfg.notifier.api_url, DEFAULT_NOTIFIER_API_URL);
        assert_eq!(cfg.notifier.template_daily, "daily_tasks_reminder");
        assert!(cfg.notifier.auth_token.is_none());
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.notifier.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let cfg = config(&[("NOTIFIER_AUTH_TOKEN", "   ")]).unwrap();
        assert!(cfg.notifier.auth_token.is_none());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = config(&[
            ("ORG_TIMEZONE", "Europe/Berlin"),
            ("RECURRING_RUN_AT", "04:30"),
            ("JOB_TIMEOUT_SECS", "60"),
            ("NOTIFIER_AUTH_TOKEN", "secret"),
            ("NOTIFIER_TEMPLATE_TASK_ASSIGNED", "new_task"),
        ])
        .unwrap();
        assert_eq!(cfg.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(cfg.recurring_run_at, NaiveTime::from_hms_opt(4, 30, 0).unwrap());
        assert_eq!(cfg.job_timeout, Duration::from_secs(60));
        assert_eq!(cfg.notifier.auth_token.as_deref(), Some("secret"));
        assert_eq!(cfg.notifier.template_task_assigned, "new_task");
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(config(&[("ORG_TIMEZONE", "Mars/Olympus")]).is_err());
        assert!(config(&[("REMINDER_RUN_AT", "8am")]).is_err());
        assert!(config(&[("DATABASE_MAX_CONNECTIONS", "lots")]).is_err());
        assert!(config(&[("NOTIFIER_TIMEOUT_SECS", "-1")]).is_err());
    }
}
