use actix_web::{HttpResponse, get, post, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ApiResponse;
use crate::forms::profile::{DecisionForm, RequestChangeForm, UpdateSelfForm};
use crate::models::config::ServerConfig;
use crate::notifications::NotificationHub;
use crate::profile_requests::ProfileRequestStore;
use crate::repository::DieselRepository;
use crate::routes::{created, error_response, ok};
use crate::services::profile as profile_service;

#[post("/profile/request-change")]
pub async fn request_change(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    store: web::Data<ProfileRequestStore>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<RequestChangeForm>,
) -> HttpResponse {
    match profile_service::request_change(repo.get_ref(), &hub, &store, &user, form) {
        Ok(request) => created(request),
        Err(err) => error_response(&err, &config),
    }
}

#[get("/profile/requests")]
pub async fn list_requests(
    user: AuthenticatedUser,
    store: web::Data<ProfileRequestStore>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match profile_service::list_requests(&store, &user) {
        Ok(requests) => ok(requests),
        Err(err) => error_response(&err, &config),
    }
}

#[get("/profile/approval")]
pub async fn my_approval(
    user: AuthenticatedUser,
    store: web::Data<ProfileRequestStore>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match profile_service::my_approval(&store, &user) {
        Ok(approval) => ok(approval),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/profile/requests/{id}/decision")]
pub async fn decide(
    request_id: web::Path<String>,
    user: AuthenticatedUser,
    hub: web::Data<NotificationHub>,
    store: web::Data<ProfileRequestStore>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<DecisionForm>,
) -> HttpResponse {
    match profile_service::decide(&hub, &store, &user, &request_id, form) {
        Ok(request) => ok(request),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/profile/update")]
pub async fn update_self(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    store: web::Data<ProfileRequestStore>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<UpdateSelfForm>,
) -> HttpResponse {
    match profile_service::update_self(repo.get_ref(), &hub, &store, &user, form) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}
