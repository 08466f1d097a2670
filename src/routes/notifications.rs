use actix_web::{HttpResponse, get, post, web};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ApiResponse;
use crate::models::config::ServerConfig;
use crate::notifications::NotificationHub;
use crate::routes::{error_response, ok};
use crate::services::notifications as notifications_service;

#[get("/notifications")]
pub async fn list_notifications(
    user: AuthenticatedUser,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match notifications_service::list_mine(&hub, &user) {
        Ok(notifications) => ok(notifications),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/notifications/read")]
pub async fn mark_read(
    user: AuthenticatedUser,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match notifications_service::mark_all_read(&hub, &user) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/notifications/clear")]
pub async fn clear_notifications(
    user: AuthenticatedUser,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match notifications_service::clear(&hub, &user) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}
