use actix_web::{web, HttpResponse, Responder};
use bcrypt::verify;
use log::{error, info};

use super::login_models::{LoginRequest, LoginResponse};
use crate::routes::common::store_failure;
use crate::state::AppState;
use crate::store::UserStore;

fn rejected(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(LoginResponse {
        success: false,
        message: message.into(),
        user: None,
    })
}

// login logic
pub async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> impl Responder {
    let email = req.email.trim().to_lowercase();
    info!("Received login request for: {}", email);

    let user = match state.store.find_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            info!("Unknown email: {}", email);
            return rejected("Invalid email or password");
        }
        Err(e) => return store_failure("look up user", e),
    };

    // Validate hashed password in DB and given password
    let valid = match verify(&req.password, &user.password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            error!("Error when checking password for {}: {}", email, e);
            false
        }
    };
    if !valid {
        info!("Invalid password for: {}", email);
        return rejected("Invalid email or password");
    }

    if !user.approved {
        info!("User {} is not approved yet", email);
        return HttpResponse::Forbidden().json(LoginResponse {
            success: false,
            message: "Account awaiting approval".into(),
            user: None,
        });
    }

    info!("User {} logged in", email);
    HttpResponse::Ok().json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        user: Some(user),
    })
}
