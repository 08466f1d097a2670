//! Actix-web handlers. Every handler returns JSON; failures are rendered
//! as `{"success": false, "error": ...}` by [`error_response`].

use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;
use serde_json::json;

use crate::dto::{ApiResponse, ErrorResponse};
use crate::models::config::ServerConfig;
use crate::repository::errors::RepositoryError;
use crate::services::ServiceError;

pub mod audit;
pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod devices;
pub mod health;
pub mod notifications;
pub mod profile;
pub mod proposals;
pub mod users;
pub mod ws;

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::ok(data))
}

pub fn status_of(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ServiceError::NotFound(_) | ServiceError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        ServiceError::Form(_)
        | ServiceError::Conflict(_)
        | ServiceError::TypeConstraint(_)
        | ServiceError::Repository(RepositoryError::ConstraintViolation(_))
        | ServiceError::Repository(RepositoryError::ValidationError(_)) => StatusCode::BAD_REQUEST,
        ServiceError::Repository(_) | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Renders `err` with its status. Server errors are logged and, in
/// production, reported with a generic message.
pub fn error_response(err: &ServiceError, config: &ServerConfig) -> HttpResponse {
    let status = status_of(err);
    let message = if status.is_server_error() {
        log::error!("Request failed: {err}");
        if config.production {
            INTERNAL_SERVER_ERROR.to_string()
        } else {
            err.to_string()
        }
    } else {
        err.to_string()
    };
    HttpResponse::build(status).json(ErrorResponse::new(message))
}

/// Malformed bodies and query strings become 400 `Validation failed`.
pub fn payload_error(err: impl std::fmt::Display, _req: &HttpRequest) -> actix_web::Error {
    let details = json!([{ "message": err.to_string() }]);
    InternalError::from_response(
        err.to_string(),
        HttpResponse::BadRequest()
            .json(ErrorResponse::new("Validation failed").with_details(details)),
    )
    .into()
}

/// Largest accepted JSON body.
pub const JSON_LIMIT: usize = 10 * 1024 * 1024;

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, req| payload_error(err, req))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, req| payload_error(err, req))
}

/// Fallback for unknown routes.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new("Endpoint not found"))
}

/// Registers every `/api` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::admin_login)
        .service(auth::refresh)
        .service(auth::logout)
        .service(auth::me)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::delete_user)
        .service(users::promote_user)
        .service(users::demote_user)
        .service(devices::list_devices)
        .service(devices::get_device)
        .service(devices::create_device)
        .service(devices::update_device)
        .service(devices::delete_device)
        .service(clients::list_clients)
        .service(clients::get_client)
        .service(clients::create_client)
        .service(clients::update_client)
        .service(clients::delete_client)
        .service(proposals::list_proposals)
        .service(proposals::get_proposal)
        .service(proposals::create_proposal)
        .service(proposals::update_status)
        .service(proposals::mark_previewed)
        .service(proposals::delete_proposal)
        .service(proposals::proposal_document)
        .service(audit::list_audit_logs)
        .service(audit::record_history)
        .service(dashboard::summary)
        .service(notifications::list_notifications)
        .service(notifications::mark_read)
        .service(notifications::clear_notifications)
        .service(profile::request_change)
        .service(profile::list_requests)
        .service(profile::my_approval)
        .service(profile::decide)
        .service(profile::update_self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_by_kind() {
        assert_eq!(
            status_of(&ServiceError::Repository(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(&ServiceError::Repository(RepositoryError::ConstraintViolation(
                "unique".to_string()
            ))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(&ServiceError::Repository(RepositoryError::ConnectionError(
                "down".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(&ServiceError::Conflict("taken".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
