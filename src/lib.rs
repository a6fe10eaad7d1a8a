pub mod attendance;
pub mod clock;
pub mod config;
pub mod error;
pub mod jobs;
pub mod kpi;
pub mod models;
pub mod notifier;
pub mod overdue;
pub mod phone;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;
