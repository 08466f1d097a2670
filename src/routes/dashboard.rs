use actix_web::{HttpResponse, get, web};

use crate::domain::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::DieselRepository;
use crate::routes::{error_response, ok};
use crate::services::dashboard as dashboard_service;

#[get("/dashboard/summary")]
pub async fn summary(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match dashboard_service::summary(repo.get_ref()) {
        Ok(summary) => ok(summary),
        Err(err) => error_response(&err, &config),
    }
}
