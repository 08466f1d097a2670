use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ApiResponse;
use crate::forms::users::CreateUserForm;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{created, error_response, ok};
use crate::services::users as users_service;

#[get("/users")]
pub async fn list_users(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match users_service::list_users(repo.get_ref(), &user) {
        Ok(users) => ok(users),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/users")]
pub async fn create_user(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<CreateUserForm>,
) -> HttpResponse {
    match users_service::create_user(repo.get_ref(), &user, form) {
        Ok(created_user) => created(created_user),
        Err(err) => error_response(&err, &config),
    }
}

#[delete("/users/{id}")]
pub async fn delete_user(
    user_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match users_service::delete_user(repo.get_ref(), &user, &user_id) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/users/{id}/promote")]
pub async fn promote_user(
    user_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match users_service::promote_user(repo.get_ref(), &user, &user_id) {
        Ok(promoted) => ok(promoted),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/users/{id}/demote")]
pub async fn demote_user(
    user_id: web::Path<String>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match users_service::demote_user(repo.get_ref(), &user, &user_id) {
        Ok(demoted) => ok(demoted),
        Err(err) => error_response(&err, &config),
    }
}
