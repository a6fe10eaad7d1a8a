use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpResponse, HttpServer};
use dotenv::dotenv;
use log::{error, info, warn};

use taskboard::config::AppConfig;
use taskboard::jobs::{run_daily, DailySchedule, ScheduledJob};
use taskboard::notifier::{HttpNotifier, Notifier};
use taskboard::routes;
use taskboard::state::AppState;
use taskboard::store::{MemoryStore, MySqlStore};

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    error!("{}: {}", context, e);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

async fn build_state(config: AppConfig, notifier: Arc<dyn Notifier>) -> io::Result<AppState> {
    match config.database_url.clone() {
        Some(url) => {
            let store = MySqlStore::connect(&url, config.database_max_connections)
                .await
                .map_err(|e| startup_error("Failed to create pool", e))?;
            store
                .migrate()
                .await
                .map_err(|e| startup_error("Failed to run migrations", e))?;
            info!("Connected to MySQL");
            Ok(AppState::new(config, Arc::new(store), notifier))
        }
        None => {
            warn!("DATABASE_URL not set, using an in-memory store; data is lost on exit");
            Ok(AppState::new(config, Arc::new(MemoryStore::new()), notifier))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;
    let notifier: Arc<dyn Notifier> = Arc::new(
        HttpNotifier::new(config.notifier.clone())
            .map_err(|e| startup_error("Failed to build notifier client", e))?,
    );
    if !notifier.is_configured() {
        warn!("NOTIFIER_AUTH_TOKEN not set, WhatsApp messages are disabled");
    }

    let server_address = config.server_address.clone();
    let state = web::Data::new(build_state(config, notifier).await?);

    let recurring: Arc<dyn ScheduledJob> = state.recurring.clone();
    let reminders: Arc<dyn ScheduledJob> = state.reminders.clone();
    for (job, at) in [
        (recurring, state.config.recurring_run_at),
        (reminders, state.config.reminder_run_at),
    ] {
        let schedule = DailySchedule::new(at, state.config.timezone);
        tokio::spawn(run_daily(job, schedule, state.config.job_timeout));
    }

    info!("Server running at http://{}", server_address);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(|| async { HttpResponse::Ok().body("taskboard is running") }))
            .configure(routes::routes::configure)
    })
    .bind(server_address)?
    .run()
    .await
}
