use actix_web::{HttpResponse, get, web};

use crate::domain::auth::AuthenticatedUser;
use crate::forms::audit::AuditQueryForm;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::error_response;
use crate::services::audit as audit_service;

#[get("/audit")]
pub async fn list_audit_logs(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
    web::Query(form): web::Query<AuditQueryForm>,
) -> HttpResponse {
    match audit_service::list_audit_logs(repo.get_ref(), &user, form) {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_response(&err, &config),
    }
}

#[get("/audit/{entity}/{record_id}")]
pub async fn record_history(
    path: web::Path<(String, String)>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    let (entity, record_id) = path.into_inner();
    match audit_service::list_record_history(repo.get_ref(), &user, &entity, &record_id) {
        Ok(history) => HttpResponse::Ok().json(history),
        Err(err) => error_response(&err, &config),
    }
}
