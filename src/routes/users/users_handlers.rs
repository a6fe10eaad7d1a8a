use actix_web::{web, HttpResponse, Responder};
use bcrypt::hash;
use log::{error, info};

use super::users_models::{CreateUserRequest, UserListResponse, UserResponse};
use crate::models::user::{normalize_email, NewUser, UserUpdate};
use crate::routes::common::{bad_request, ok_message, store_failure};
use crate::state::AppState;
use crate::store::UserStore;

/// bcrypt work factor for stored passwords.
pub const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

pub async fn list_users(state: web::Data<AppState>) -> impl Responder {
    match state.store.list_users().await {
        Ok(users) => HttpResponse::Ok().json(UserListResponse { users }),
        Err(e) => store_failure("list users", e),
    }
}

// register a member; passwords are only ever stored hashed
pub async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<CreateUserRequest>,
) -> impl Responder {
    let req = req.into_inner();
    let email = normalize_email(&req.email);
    if req.name.trim().is_empty() || email.is_empty() || req.password.is_empty() {
        return bad_request("Name, email and password are required");
    }
    info!("Received request to create user: {}", email);

    match state.store.find_user_by_email(&email).await {
        Ok(Some(_)) => {
            info!("Email already registered: {}", email);
            return HttpResponse::Conflict().json(UserResponse {
                success: false,
                message: "Email already registered".into(),
                user: None,
            });
        }
        Ok(None) => {}
        Err(e) => return store_failure("look up user", e),
    }

    let password_hash = match hash(&req.password, PASSWORD_COST) {
        Ok(h) => h,
        Err(e) => {
            error!("Failed to hash password: {}", e);
            return HttpResponse::InternalServerError().json(UserResponse {
                success: false,
                message: "Failed to hash password".into(),
                user: None,
            });
        }
    };

    let new = NewUser {
        name: req.name.trim().to_string(),
        email,
        role: req.role,
        phone: req.phone.filter(|p| !p.trim().is_empty()),
        city: req.city,
        password_hash,
    };
    match state.store.create_user(new).await {
        Ok(user) => {
            info!("User {} created", user.id);
            HttpResponse::Ok().json(UserResponse {
                success: true,
                message: "User created".into(),
                user: Some(user),
            })
        }
        Err(e) => store_failure("create user", e),
    }
}

pub async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UserUpdate>,
) -> impl Responder {
    let id = path.into_inner();
    let mut update = req.into_inner();
    if let Some(email) = update.email.as_deref() {
        let email = normalize_email(email);
        if email.is_empty() {
            return bad_request("Email must not be blank");
        }
        match state.store.find_user_by_email(&email).await {
            Ok(Some(other)) if other.id != id => {
                info!("Email {} already belongs to user {}", email, other.id);
                return HttpResponse::Conflict().json(UserResponse {
                    success: false,
                    message: "Email already registered".into(),
                    user: None,
                });
            }
            Ok(_) => {}
            Err(e) => return store_failure("look up user", e),
        }
        update.email = Some(email);
    }
    match state.store.update_user(&id, update).await {
        Ok(user) => HttpResponse::Ok().json(UserResponse {
            success: true,
            message: "User updated".into(),
            user: Some(user),
        }),
        Err(e) => store_failure("update user", e),
    }
}

pub async fn delete_user(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let id = path.into_inner();
    match state.store.delete_user(&id).await {
        Ok(()) => {
            info!("User {} deleted", id);
            ok_message("User deleted")
        }
        Err(e) => store_failure("delete user", e),
    }
}
