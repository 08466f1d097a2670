use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ApiResponse;
use crate::forms::devices::{CreateDeviceForm, UpdateDeviceForm};
use crate::models::config::ServerConfig;
use crate::notifications::NotificationHub;
use crate::repository::DieselRepository;
use crate::routes::{created, error_response, ok};
use crate::services::audit::RequestMeta;
use crate::services::devices as devices_service;

#[get("/devices")]
pub async fn list_devices(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match devices_service::list_devices(repo.get_ref()) {
        Ok(devices) => ok(devices),
        Err(err) => error_response(&err, &config),
    }
}

#[get("/devices/{id}")]
pub async fn get_device(
    device_id: web::Path<String>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match devices_service::get_device(repo.get_ref(), &device_id) {
        Ok(device) => ok(device),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/devices")]
pub async fn create_device(
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<CreateDeviceForm>,
) -> HttpResponse {
    match devices_service::create_device(repo.get_ref(), &hub, &user, &meta, form) {
        Ok(device) => created(device),
        Err(err) => error_response(&err, &config),
    }
}

#[put("/devices/{id}")]
pub async fn update_device(
    device_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<UpdateDeviceForm>,
) -> HttpResponse {
    match devices_service::update_device(repo.get_ref(), &hub, &user, &meta, &device_id, form) {
        Ok(device) => ok(device),
        Err(err) => error_response(&err, &config),
    }
}

#[delete("/devices/{id}")]
pub async fn delete_device(
    device_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match devices_service::delete_device(repo.get_ref(), &hub, &user, &meta, &device_id) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}
