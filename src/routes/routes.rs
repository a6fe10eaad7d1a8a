use actix_web::web;

use super::admin::admin_handlers;
use super::calendar::calendar_handlers;
use super::kpi::kpi_handlers;
use super::login::login_handlers;
use super::red_zone::red_zone_handlers;
use super::removal::removal_handlers;
use super::tasks::tasks_handlers;
use super::users::users_handlers;

pub fn login_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-login")
            .route("/login", web::post().to(login_handlers::login))
    );
}

pub fn users_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-users")
            .route("", web::get().to(users_handlers::list_users))
            .route("", web::post().to(users_handlers::create_user))
            .route("/{id}", web::put().to(users_handlers::update_user))
            .route("/{id}", web::delete().to(users_handlers::delete_user))
    );
}

pub fn tasks_configure(cfg: &mut web::ServiceConfig) {
    // Fixed paths go before `/{id}` so they are not captured as ids.
    cfg.service(
        web::scope("/api-tasks")
            .route("", web::get().to(tasks_handlers::list_tasks))
            .route("", web::post().to(tasks_handlers::create_task))
            .route("/recent-completed", web::get().to(tasks_handlers::recent_completed))
            .route("/bogus-attachments", web::get().to(tasks_handlers::bogus_attachments))
            .route("/incomplete/{user_id}", web::get().to(tasks_handlers::incomplete_for_user))
            .route("/{id}", web::get().to(tasks_handlers::get_task))
            .route("/{id}", web::put().to(tasks_handlers::update_task))
            .route("/{id}", web::delete().to(tasks_handlers::delete_task))
            .route("/{id}/complete", web::post().to(tasks_handlers::complete_task))
            .route("/{id}/audit", web::post().to(tasks_handlers::audit_task))
    );
}

pub fn kpi_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-kpi")
            .route("", web::get().to(kpi_handlers::kpi))
            .route("/members", web::get().to(kpi_handlers::member_kpi))
    );
}

pub fn red_zone_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-red-zone")
            .route("", web::get().to(red_zone_handlers::red_zone))
    );
}

pub fn calendar_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-calendar")
            .route("/holidays", web::get().to(calendar_handlers::list_holidays))
            .route("/holidays", web::post().to(calendar_handlers::add_holiday))
            .route("/holidays/{id}", web::delete().to(calendar_handlers::delete_holiday))
            .route("/absences", web::get().to(calendar_handlers::list_absences))
            .route("/absences", web::post().to(calendar_handlers::add_absence))
    );
}

pub fn removal_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api-removal-requests")
            .route("", web::get().to(removal_handlers::list_requests))
            .route("", web::post().to(removal_handlers::create_request))
            .route("/{id}/resolve", web::post().to(removal_handlers::resolve_request))
    );
}

pub fn admin_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/jobs/recurring", web::post().to(admin_handlers::run_recurring))
            .route("/jobs/reminders", web::post().to(admin_handlers::run_reminders))
    );
}

/// Every scope of the API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(login_configure)
        .configure(users_configure)
        .configure(tasks_configure)
        .configure(kpi_configure)
        .configure(red_zone_configure)
        .configure(calendar_configure)
        .configure(removal_configure)
        .configure(admin_configure);
}
