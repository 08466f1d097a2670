use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ApiResponse;
use crate::forms::clients::{CreateClientForm, UpdateClientForm};
use crate::models::config::ServerConfig;
use crate::notifications::NotificationHub;
use crate::repository::DieselRepository;
use crate::routes::{created, error_response, ok};
use crate::services::audit::RequestMeta;
use crate::services::clients as clients_service;

#[get("/clients")]
pub async fn list_clients(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match clients_service::list_clients(repo.get_ref()) {
        Ok(clients) => ok(clients),
        Err(err) => error_response(&err, &config),
    }
}

#[get("/clients/{id}")]
pub async fn get_client(
    client_id: web::Path<String>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match clients_service::get_client(repo.get_ref(), &client_id) {
        Ok(client) => ok(client),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/clients")]
pub async fn create_client(
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<CreateClientForm>,
) -> HttpResponse {
    match clients_service::create_client(repo.get_ref(), &hub, &user, &meta, form) {
        Ok(client) => created(client),
        Err(err) => error_response(&err, &config),
    }
}

#[put("/clients/{id}")]
pub async fn update_client(
    client_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<UpdateClientForm>,
) -> HttpResponse {
    match clients_service::update_client(repo.get_ref(), &hub, &user, &meta, &client_id, form) {
        Ok(client) => ok(client),
        Err(err) => error_response(&err, &config),
    }
}

#[delete("/clients/{id}")]
pub async fn delete_client(
    client_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match clients_service::delete_client(repo.get_ref(), &hub, &user, &meta, &client_id) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}
