use actix_web::{HttpResponse, delete, get, patch, post, web};
use tera::{Context, Tera};

use crate::domain::auth::AuthenticatedUser;
use crate::dto::ApiResponse;
use crate::forms::proposals::{CreateProposalForm, UpdateStatusForm};
use crate::models::config::ServerConfig;
use crate::notifications::NotificationHub;
use crate::repository::DieselRepository;
use crate::routes::{created, error_response, ok};
use crate::services::audit::RequestMeta;
use crate::services::proposals as proposals_service;

#[get("/proposals")]
pub async fn list_proposals(
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match proposals_service::list_proposals(repo.get_ref()) {
        Ok(proposals) => ok(proposals),
        Err(err) => error_response(&err, &config),
    }
}

#[get("/proposals/{id}")]
pub async fn get_proposal(
    proposal_id: web::Path<String>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match proposals_service::get_proposal(repo.get_ref(), &proposal_id) {
        Ok(proposal) => ok(proposal),
        Err(err) => error_response(&err, &config),
    }
}

#[post("/proposals")]
pub async fn create_proposal(
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<CreateProposalForm>,
) -> HttpResponse {
    match proposals_service::create_proposal(repo.get_ref(), &hub, &user, &meta, form) {
        Ok(proposal) => created(proposal),
        Err(err) => error_response(&err, &config),
    }
}

#[patch("/proposals/{id}/status")]
pub async fn update_status(
    proposal_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
    web::Json(form): web::Json<UpdateStatusForm>,
) -> HttpResponse {
    match proposals_service::update_status(repo.get_ref(), &hub, &user, &meta, &proposal_id, form)
    {
        Ok(proposal) => ok(proposal),
        Err(err) => error_response(&err, &config),
    }
}

#[patch("/proposals/{id}/previewed")]
pub async fn mark_previewed(
    proposal_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match proposals_service::mark_previewed(repo.get_ref(), &user, &meta, &proposal_id) {
        Ok(proposal) => ok(proposal),
        Err(err) => error_response(&err, &config),
    }
}

#[delete("/proposals/{id}")]
pub async fn delete_proposal(
    proposal_id: web::Path<String>,
    user: AuthenticatedUser,
    meta: RequestMeta,
    repo: web::Data<DieselRepository>,
    hub: web::Data<NotificationHub>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    match proposals_service::delete_proposal(repo.get_ref(), &hub, &user, &meta, &proposal_id) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::empty()),
        Err(err) => error_response(&err, &config),
    }
}

/// Printable HTML rendition of a proposal.
#[get("/proposals/{id}/document")]
pub async fn proposal_document(
    proposal_id: web::Path<String>,
    _user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    tera: web::Data<Tera>,
    config: web::Data<ServerConfig>,
) -> HttpResponse {
    let document = match proposals_service::proposal_document(repo.get_ref(), &proposal_id) {
        Ok(document) => document,
        Err(err) => return error_response(&err, &config),
    };

    let mut context = Context::new();
    context.insert("company_name", &config.company_name);
    context.insert("document", &document);

    match tera.render("proposals/document.html", &context) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body),
        Err(err) => {
            log::error!("Failed to render proposal document: {err}");
            HttpResponse::InternalServerError().json(crate::dto::ErrorResponse::new(
                crate::routes::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}
