pub mod common;
pub mod routes;

pub mod login {
    pub mod login_handlers;
    pub mod login_models;
}

pub mod users {
    pub mod users_handlers;
    pub mod users_models;
}

pub mod tasks {
    pub mod tasks_handlers;
    pub mod tasks_models;
}

pub mod kpi {
    pub mod kpi_handlers;
    pub mod kpi_models;
}

pub mod red_zone {
    pub mod red_zone_handlers;
    pub mod red_zone_models;
}

pub mod calendar {
    pub mod calendar_handlers;
    pub mod calendar_models;
}

pub mod removal {
    pub mod removal_handlers;
    pub mod removal_models;
}

pub mod admin {
    pub mod admin_handlers;
    pub mod admin_models;
}
