use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::clock::org_today;
use crate::config::AppConfig;
use crate::jobs::{RecurringInstantiator, ReminderDispatcher};
use crate::notifier::Notifier;
use crate::store::Store;

/// Handles shared by every request handler and the scheduled jobs.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub notifier: Arc<dyn Notifier>,
    pub recurring: Arc<RecurringInstantiator>,
    pub reminders: Arc<ReminderDispatcher>,
}

impl AppState {
    pub fn new<S>(config: AppConfig, store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self
    where
        S: Store + 'static,
    {
        let recurring = Arc::new(RecurringInstantiator::new(store.clone()));
        let reminders = Arc::new(ReminderDispatcher::new(
            store.clone(),
            notifier.clone(),
            config.notifier.template_daily.clone(),
        ));
        AppState {
            config,
            store,
            notifier,
            recurring,
            reminders,
        }
    }

    /// Today's date in the organization's zone.
    pub fn today(&self) -> NaiveDate {
        org_today(Utc::now(), self.config.timezone)
    }
}
